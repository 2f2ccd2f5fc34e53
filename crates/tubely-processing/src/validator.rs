use tubely_core::MediaKind;

/// Content type reported when the leading bytes match no known signature.
pub const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// Validation errors raised before an upload is staged
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: exceeds {max} bytes")]
    FileTooLarge { max: u64 },

    #[error("Unsupported content type: {content_type} (allowed: {allowed:?})")]
    UnsupportedContentType {
        content_type: String,
        allowed: Vec<String>,
    },
}

/// Content type detected from an upload's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniffedType {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

impl SniffedType {
    /// Extension with its leading dot, as used in storage keys.
    pub fn file_extension(&self) -> String {
        format!(".{}", self.extension)
    }
}

/// Detect a content type from magic bytes. `None` when nothing matches.
pub fn detect_content_type(head: &[u8]) -> Option<SniffedType> {
    infer::get(head).map(|kind| SniffedType {
        mime_type: kind.mime_type(),
        extension: kind.extension(),
    })
}

fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Upload validator for one media kind.
///
/// The declared content type of a request is informational only; acceptance
/// is decided from sniffed bytes.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    max_file_size: u64,
    allowed_content_types: &'static [&'static str],
}

impl MediaValidator {
    pub fn new(max_file_size: u64, allowed_content_types: &'static [&'static str]) -> Self {
        Self {
            max_file_size,
            allowed_content_types,
        }
    }

    pub fn for_kind(kind: MediaKind, max_file_size: u64) -> Self {
        Self::new(max_file_size, kind.allowed_content_types())
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate the number of bytes received so far
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Reject early when the client already announced an oversized body.
    pub fn validate_declared_size(&self, declared: Option<u64>) -> Result<(), ValidationError> {
        match declared {
            Some(size) => self.validate_file_size(size),
            None => Ok(()),
        }
    }

    /// Sniff `head` and check the result against the allow-list.
    pub fn sniff(
        &self,
        head: &[u8],
        declared_content_type: Option<&str>,
    ) -> Result<SniffedType, ValidationError> {
        let sniffed = detect_content_type(head);
        let detected = sniffed.map_or(UNKNOWN_CONTENT_TYPE, |s| s.mime_type);

        if let Some(declared) = declared_content_type {
            let declared = normalize_mime_type(declared);
            if !declared.is_empty() && declared != detected {
                tracing::warn!(
                    declared_content_type = %declared,
                    detected_content_type = %detected,
                    "Declared content type does not match file contents"
                );
            }
        }

        match sniffed {
            Some(sniffed) if self.allowed_content_types.contains(&sniffed.mime_type) => Ok(sniffed),
            _ => Err(ValidationError::UnsupportedContentType {
                content_type: detected.to_string(),
                allowed: self
                    .allowed_content_types
                    .iter()
                    .map(|ct| ct.to_string())
                    .collect(),
            }),
        }
    }
}
