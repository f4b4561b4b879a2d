use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::video;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::pagination::PaginatedResponse;
use crate::services::keys::key_from_object_url;

use super::AppState;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateVideoRequest {
    title: String,
    description: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<video::Model> for VideoResponse {
    fn from(model: video::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            thumbnail_url: model.thumbnail_url,
            video_url: model.video_url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ListVideosQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video record created", body = VideoResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Videos"
)]
pub async fn create_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoResponse>), AppError> {
    let now = chrono::Utc::now().naive_utc();
    let new_video = video::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        title: Set(payload.title),
        description: Set(payload.description),
        thumbnail_url: Set(None),
        video_url: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = new_video.insert(&state.db).await.map_err(AppError::DatabaseError)?;

    println!("Videos | POST /videos | user={} | video={} | res=201", user.id, created.id);
    Ok((StatusCode::CREATED, Json(VideoResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/videos",
    params(ListVideosQuery),
    responses(
        (status = 200, description = "The caller's videos", body = PaginatedResponse<VideoResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Videos"
)]
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListVideosQuery>,
) -> Result<Json<PaginatedResponse<VideoResponse>>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let paginator = video::Entity::find()
        .filter(video::Column::UserId.eq(user.id))
        .order_by_desc(video::Column::CreatedAt)
        .paginate(&state.db, limit);

    let total = paginator.num_items().await.map_err(AppError::DatabaseError)?;
    let items = paginator
        .fetch_page(page - 1)
        .await
        .map_err(AppError::DatabaseError)?
        .into_iter()
        .map(VideoResponse::from)
        .collect();

    Ok(Json(PaginatedResponse::new(items, total, page, limit)))
}

#[utoipa::path(
    get,
    path = "/videos/{id}",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video details", body = VideoResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<VideoResponse>, AppError> {
    let found = owned_video(&state, &user, id).await?;
    Ok(Json(VideoResponse::from(found)))
}

#[utoipa::path(
    delete,
    path = "/videos/{id}",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Videos"
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let found = owned_video(&state, &user, id).await?;

    // Best-effort removal of the stored objects; the record goes regardless
    let bucket = &crate::config::get_config().s3_bucket_name;
    for stored_url in [&found.video_url, &found.thumbnail_url].into_iter().flatten() {
        if let Some(key) = key_from_object_url(stored_url, bucket) {
            if let Err(e) = state.objects.delete_object(&key).await {
                eprintln!("Videos | Failed to delete object {}: {:?}", key, e);
            }
        }
    }

    video::Entity::delete_by_id(id)
        .exec(&state.db)
        .await
        .map_err(AppError::DatabaseError)?;

    println!("Videos | DELETE /videos/{} | user={} | res=200", id, user.id);
    Ok(Json(serde_json::json!({
        "message": "Video deleted successfully",
        "id": id
    })))
}

/// Lookup with the ownership rule applied: a db error, a missing row and a
/// foreign owner all come back as the same Forbidden.
async fn owned_video(state: &AppState, user: &AuthUser, id: Uuid) -> Result<video::Model, AppError> {
    let found = match video::Entity::find_by_id(id).one(&state.db).await {
        Ok(Some(v)) => v,
        _ => {
            return Err(AppError::Forbidden(
                "You do not have access to this video".to_string(),
            ))
        }
    };

    if found.user_id != user.id {
        return Err(AppError::Forbidden(
            "You do not have access to this video".to_string(),
        ));
    }

    Ok(found)
}
