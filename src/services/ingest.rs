use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use uuid::Uuid;

use crate::entities::video;
use crate::error::AppError;
use crate::services::keys::{random_base_name, thumbnail_object_key, video_object_key};
use crate::services::probe::GeometryProbe;
use crate::services::s3::ObjectStore;
use crate::services::staging::{StagedFiles, StagingStore};
use crate::services::tool::ToolRunner;
use crate::services::transcode::FastStartRewriter;

/// Media types accepted for the main video upload.
const ACCEPTED_VIDEO_TYPES: &[&str] = &["video/mp4"];
/// Media types accepted for thumbnails (stored byte-for-byte).
const ACCEPTED_THUMBNAIL_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Narrow record-store seam: the pipeline only ever looks a video up and
/// writes back a location.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<video::Model>, DbErr>;
    async fn set_video_url(&self, video: video::Model, url: String)
        -> Result<video::Model, DbErr>;
    async fn set_thumbnail_url(
        &self,
        video: video::Model,
        url: String,
    ) -> Result<video::Model, DbErr>;
}

pub struct SeaVideoStore {
    db: DatabaseConnection,
}

impl SeaVideoStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoStore for SeaVideoStore {
    async fn get(&self, id: Uuid) -> Result<Option<video::Model>, DbErr> {
        video::Entity::find_by_id(id).one(&self.db).await
    }

    async fn set_video_url(
        &self,
        video: video::Model,
        url: String,
    ) -> Result<video::Model, DbErr> {
        let mut active: video::ActiveModel = video.into();
        active.video_url = Set(Some(url));
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(&self.db).await
    }

    async fn set_thumbnail_url(
        &self,
        video: video::Model,
        url: String,
    ) -> Result<video::Model, DbErr> {
        let mut active: video::ActiveModel = video.into();
        active.thumbnail_url = Set(Some(url));
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        active.update(&self.db).await
    }
}

/// Sequences one upload: ownership check, staging, geometry probe,
/// fast-start rewrite, keyed upload, record update. Every staged file is
/// removed before the record is touched, on success and on every failure.
pub struct Ingestor {
    videos: Arc<dyn VideoStore>,
    objects: Arc<dyn ObjectStore>,
    staging: StagingStore,
    probe: GeometryProbe,
    rewriter: FastStartRewriter,
}

impl Ingestor {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        objects: Arc<dyn ObjectStore>,
        runner: Arc<dyn ToolRunner>,
        staging: StagingStore,
    ) -> Self {
        Self {
            videos,
            objects,
            staging,
            probe: GeometryProbe::new(runner.clone()),
            rewriter: FastStartRewriter::new(runner),
        }
    }

    pub async fn ingest_video(
        &self,
        caller: Uuid,
        video_id: Uuid,
        media_type: &str,
        data: Bytes,
    ) -> Result<video::Model, AppError> {
        let video = self.owned_video(caller, video_id).await?;

        if !ACCEPTED_VIDEO_TYPES.contains(&media_type) {
            return Err(AppError::UnsupportedMediaType(format!(
                "Unsupported media type: {}",
                media_type
            )));
        }

        let mut staged = StagedFiles::new();
        let result = self.process_video(media_type, &data, &mut staged).await;
        staged.cleanup().await;
        let key = result?;

        // The object is confirmed stored at this point; a failure below
        // leaves it dangling but never leaves the record pointing at
        // something that does not exist.
        let url = self.objects.object_url(&key);
        self.videos
            .set_video_url(video, url)
            .await
            .map_err(|e| AppError::PersistFailure(e.to_string()))
    }

    /// Thumbnails are stored byte-for-byte; no staging or processing.
    pub async fn ingest_thumbnail(
        &self,
        caller: Uuid,
        video_id: Uuid,
        media_type: &str,
        data: Bytes,
    ) -> Result<video::Model, AppError> {
        let video = self.owned_video(caller, video_id).await?;

        if !ACCEPTED_THUMBNAIL_TYPES.contains(&media_type) {
            return Err(AppError::UnsupportedMediaType(format!(
                "Unsupported media type: {}",
                media_type
            )));
        }

        let key = thumbnail_object_key(&random_base_name(), media_type);
        self.objects.put_object(&key, data.to_vec(), media_type).await?;

        let url = self.objects.object_url(&key);
        self.videos
            .set_thumbnail_url(video, url)
            .await
            .map_err(|e| AppError::PersistFailure(e.to_string()))
    }

    /// A failed lookup, a missing record and an owner mismatch all look the
    /// same from the outside; existence is never confirmed to non-owners.
    async fn owned_video(&self, caller: Uuid, video_id: Uuid) -> Result<video::Model, AppError> {
        let video = match self.videos.get(video_id).await {
            Ok(Some(v)) => v,
            _ => {
                return Err(AppError::Forbidden(
                    "You do not have access to this video".to_string(),
                ))
            }
        };

        if video.user_id != caller {
            return Err(AppError::Forbidden(
                "You do not have access to this video".to_string(),
            ));
        }

        Ok(video)
    }

    async fn process_video(
        &self,
        media_type: &str,
        data: &[u8],
        staged: &mut StagedFiles,
    ) -> Result<String, AppError> {
        let input = self.staging.stage(data, staged).await?;
        let orientation = self.probe.probe(&input).await?;
        let processed = self.rewriter.rewrite(&input, staged).await?;

        let key = video_object_key(orientation, &random_base_name(), media_type);
        self.objects
            .put_file(&key, processed.path(), media_type)
            .await?;

        Ok(key)
    }
}
