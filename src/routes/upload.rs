use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;

use super::videos::VideoResponse;
use super::AppState;

// Strip any parameters (`; codecs=...`) from a declared content type
fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[utoipa::path(
    post,
    path = "/videos/{id}/upload",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video processed and stored", body = VideoResponse),
        (status = 400, description = "Bad request or unsupported media type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Upload"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VideoResponse>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name() == Some("video") {
            let media_type = field
                .content_type()
                .map(normalize_media_type)
                .ok_or(AppError::BadRequest(
                    "Missing Content-Type for video".to_string(),
                ))?;
            let data = field
                .bytes()
                .await
                .map_err(|_| AppError::BadRequest("Failed to read video bytes".to_string()))?;

            let updated = state
                .ingestor
                .ingest_video(user.id, id, &media_type, data)
                .await?;

            println!("Upload | POST /videos/{}/upload | user={} | res=201", id, user.id);
            return Ok((StatusCode::CREATED, Json(VideoResponse::from(updated))));
        }
    }

    println!("Upload | POST /videos/{}/upload | user={} | res=400 | No video field found", id, user.id);
    Err(AppError::BadRequest("No video field found".to_string()))
}

#[utoipa::path(
    post,
    path = "/videos/{id}/thumbnail",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoResponse),
        (status = 400, description = "Bad request or unsupported media type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Upload"
)]
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name() == Some("thumbnail") {
            let media_type = field
                .content_type()
                .map(normalize_media_type)
                .ok_or(AppError::BadRequest(
                    "Missing Content-Type for thumbnail".to_string(),
                ))?;
            let data = field
                .bytes()
                .await
                .map_err(|_| AppError::BadRequest("Failed to read thumbnail bytes".to_string()))?;

            let updated = state
                .ingestor
                .ingest_thumbnail(user.id, id, &media_type, data)
                .await?;

            println!("Upload | POST /videos/{}/thumbnail | user={} | res=200", id, user.id);
            return Ok(Json(VideoResponse::from(updated)));
        }
    }

    println!("Upload | POST /videos/{}/thumbnail | user={} | res=400 | No thumbnail field found", id, user.id);
    Err(AppError::BadRequest("No thumbnail field found".to_string()))
}
