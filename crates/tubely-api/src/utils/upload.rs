//! Shared request flow for the multipart upload endpoints.

use std::io;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::http::{header::CONTENT_LENGTH, HeaderMap, StatusCode};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tubely_core::{AppError, MediaKind, Video};
use tubely_processing::{BodyLimitExceeded, UploadBody};
use uuid::Uuid;

use crate::auth::authenticate;
use crate::error::HttpAppError;
use crate::state::AppState;

pub fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput("Invalid ID".to_string()))
}

/// Map a multipart failure to a client error. A tripped body limit is an
/// oversized upload, not a malformed form.
fn form_error(status: StatusCode, body_text: String, max_bytes: u64) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!(
            "File exceeds the maximum size of {} bytes",
            max_bytes
        ))
    } else {
        AppError::InvalidInput(format!("Couldn't parse form: {}", body_text))
    }
}

/// Authenticate, authorize, then stream the `kind` form field into the
/// pipeline.
///
/// The multipart body is not touched until the caller is known to own the
/// video, so a rejected request never reads upload bytes.
pub async fn ingest_multipart(
    state: &AppState,
    raw_id: &str,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
    kind: MediaKind,
) -> Result<Video, HttpAppError> {
    let video_id = parse_video_id(raw_id)?;
    let owner_id = authenticate(&state.jwt, headers)?;
    let authorized = state.pipeline.authorize(video_id, owner_id).await?;

    let max_bytes = match kind {
        MediaKind::Thumbnail => state.config.max_thumbnail_size_bytes(),
        MediaKind::Video => state.config.max_video_size_bytes(),
    };
    let mut multipart = multipart
        .map_err(|rejection| form_error(rejection.status(), rejection.body_text(), max_bytes))?;

    let field_name = kind.form_field();
    let field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| form_error(e.status(), e.body_text(), max_bytes))?
        {
            Some(field) if field.name() == Some(field_name) => break field,
            Some(_) => continue,
            None => {
                return Err(
                    AppError::InvalidInput(format!("Missing form field: {}", field_name)).into(),
                )
            }
        }
    };

    let declared_content_type = field.content_type().map(str::to_string);
    let declared_length = field
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let reader = StreamReader::new(field.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            BodyLimitExceeded.into_io_error()
        } else {
            io::Error::other(e.body_text())
        }
    }));
    let body = UploadBody::new(reader)
        .with_content_type(declared_content_type)
        .with_declared_length(declared_length);

    let video = state
        .pipeline
        .ingest_authorized(authorized, kind, body)
        .await?;
    Ok(video)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubely_core::ErrorMetadata;

    #[test]
    fn test_parse_video_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_video_id(&id.to_string()).unwrap(), id);

        let err = parse_video_id("not-a-uuid").unwrap_err();
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.client_message(), "Invalid ID");
    }

    #[test]
    fn test_form_error_maps_body_limit_to_payload_too_large() {
        let err = form_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request payload is too large".to_string(),
            1024,
        );
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");

        let err = form_error(StatusCode::BAD_REQUEST, "bad boundary".to_string(), 1024);
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.client_message().contains("bad boundary"));
    }
}
