use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::ingest_multipart;
use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        Path, State,
    },
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tubely_core::{MediaKind, Video};

/// Upload the video file for an existing video record.
///
/// The file is probed for its aspect ratio, remuxed for fast start and stored
/// under `landscape/`, `portrait/` or `other/`.
#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = String, Path, description = "Video ID (UUID)")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video stored and record updated", body = Video),
        (status = 400, description = "Invalid ID, missing field, oversized or unsupported file", body = ErrorResponse),
        (status = 401, description = "Missing token or not the video owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Processing, storage or metadata failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, headers, multipart), fields(video_id = %video_id))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Video>, HttpAppError> {
    let video = ingest_multipart(&state, &video_id, &headers, multipart, MediaKind::Video).await?;
    Ok(Json(video))
}
