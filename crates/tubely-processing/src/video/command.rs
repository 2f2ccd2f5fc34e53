use std::io;
use std::path::{Component, Path};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

const DANGEROUS_CHARS: [char; 11] = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];

/// Failure running an external media tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with code {code:?}")]
    Exit {
        program: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {timeout:?}")]
    Timeout {
        program: &'static str,
        timeout: Duration,
    },

    #[error("path contains unsafe characters: {0}")]
    UnsafePath(String),
}

/// Reject paths containing shell metacharacters or directory traversal.
pub(crate) fn validate_path(path: &str) -> Result<(), ToolError> {
    let traverses = Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir));
    if traverses || path.chars().any(|c| DANGEROUS_CHARS.contains(&c)) {
        return Err(ToolError::UnsafePath(path.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_file_path(path: &Path) -> Result<(), ToolError> {
    validate_path(&path.to_string_lossy())
}

/// Run `command` to completion and return its stdout.
///
/// stdin is closed, and each non-empty stderr line is forwarded to the log
/// under the `tubely::subprocess` target. The child is killed if the returned
/// future is dropped or the timeout elapses.
pub(crate) async fn run_tool(
    mut command: Command,
    program: &'static str,
    timeout: Option<Duration>,
) -> Result<Vec<u8>, ToolError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command
        .spawn()
        .map_err(|source| ToolError::Spawn { program, source })?;

    let waiting = child.wait_with_output();
    let output = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, waiting)
            .await
            .map_err(|_| ToolError::Timeout { program, timeout })?,
        None => waiting.await,
    }
    .map_err(|source| ToolError::Spawn { program, source })?;

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    forward_stderr(program, &stderr);

    if !output.status.success() {
        return Err(ToolError::Exit {
            program,
            code: output.status.code(),
            stderr,
        });
    }

    Ok(output.stdout)
}

fn forward_stderr(program: &str, stderr: &str) {
    for line in stderr.lines().map(str::trim).filter(|l| !l.is_empty()) {
        tracing::warn!(target: "tubely::subprocess", program, "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("/usr/bin/ffprobe").is_ok());
        assert!(validate_path("/tmp/tubely-upload-Ab12.mp4").is_ok());
        assert!(validate_path("ffprobe; rm -rf /").is_err());
        assert!(validate_path("/tmp/$(whoami).mp4").is_err());
        assert!(validate_path("/tmp/../etc/passwd").is_err());
        assert!(validate_path("../staging/upload.mp4").is_err());
    }

    #[test]
    fn test_validate_path_allows_dots_inside_names() {
        assert!(validate_path("/data/a..b/tubely-upload-Ab12.mp4").is_ok());
        assert!(validate_file_path(Path::new("/srv/v1..2/clip..final.mp4")).is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tool_reports_exit_code() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo oops >&2; exit 3"]);

        let err = run_tool(command, "sh", None).await.unwrap_err();
        match err {
            ToolError::Exit { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("oops"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tool_times_out() {
        let mut command = Command::new("sleep");
        command.arg("5");

        let err = run_tool(command, "sleep", Some(Duration::from_millis(50)))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_run_tool_missing_binary() {
        let command = Command::new("/nonexistent/tubely-tool");
        let err = run_tool(command, "ffprobe", None).await.unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
