use crate::auth::authenticate;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::parse_video_id;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tubely_core::{AppError, Video};

#[utoipa::path(
    get,
    path = "/api/videos/{video_id}",
    tag = "videos",
    params(
        ("video_id" = String, Path, description = "Video ID (UUID)")
    ),
    responses(
        (status = 200, description = "Video found", body = Video),
        (status = 400, description = "Invalid ID", body = ErrorResponse),
        (status = 401, description = "Missing token or not the video owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, headers), fields(video_id = %video_id))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Video>, HttpAppError> {
    let id = parse_video_id(&video_id)?;
    let user_id = authenticate(&state.jwt, &headers)?;

    let video = state
        .videos
        .get_video(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))?;

    if !video.is_owned_by(user_id) {
        return Err(AppError::Unauthorized("Not authorized to view this video".to_string()).into());
    }

    Ok(Json(video))
}
