use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::config::get_config;
use crate::error::AppError;

/// Narrow object-store seam; the ingestion pipeline talks to this trait so
/// it can run against a recording fake in tests.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> Result<(), AppError>;
    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> Result<(), AppError>;
    async fn delete_object(&self, key: &str) -> Result<(), AppError>;
    fn object_url(&self, key: &str) -> String;
}

#[derive(Clone)]
pub struct S3Service {
    client: Client,
    pub bucket_name: String,
}

impl S3Service {
    pub async fn new() -> Self {
        let config = get_config();
        let region = aws_sdk_s3::config::Region::new(config.aws_region.clone());

        let client = match (&config.aws_access_key_id, &config.aws_secret_access_key) {
            (Some(key_id), Some(secret)) => {
                let credentials = aws_sdk_s3::config::Credentials::new(
                    key_id.clone(),
                    secret.clone(),
                    None,
                    None,
                    "manual_config",
                );

                let mut s3_config_builder = aws_sdk_s3::config::Builder::new()
                    .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
                    .region(region)
                    .credentials_provider(credentials);

                if let Some(endpoint) = &config.s3_endpoint {
                    s3_config_builder = s3_config_builder
                        .endpoint_url(endpoint)
                        .force_path_style(true);
                }

                Client::from_conf(s3_config_builder.build())
            }
            _ => {
                // No explicit keys: use the default provider chain
                let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                Client::new(&shared)
            }
        };

        Self {
            client,
            bucket_name: config.s3_bucket_name.clone(),
        }
    }

    pub async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        let resp = self.client.head_bucket().bucket(&self.bucket_name).send().await;

        match resp {
            Ok(_) => {
                self.set_public_policy().await?;
                Ok(())
            }
            Err(_) => {
                println!("Bucket {} does not exist, attempting to create...", self.bucket_name);
                self.client
                    .create_bucket()
                    .bucket(&self.bucket_name)
                    .send()
                    .await
                    .map_err(|e| {
                        AppError::InternalServerError(format!("Failed to create S3 bucket: {}", e))
                    })?;

                self.set_public_policy().await?;
                Ok(())
            }
        }
    }

    async fn set_public_policy(&self) -> Result<(), AppError> {
        let policy = format!(
            r#"{{
                "Version": "2012-10-17",
                "Statement": [
                    {{
                        "Sid": "PublicReadGetObject",
                        "Effect": "Allow",
                        "Principal": "*",
                        "Action": "s3:GetObject",
                        "Resource": "arn:aws:s3:::{}/*"
                    }}
                ]
            }}"#,
            self.bucket_name
        );

        self.client
            .put_bucket_policy()
            .bucket(&self.bucket_name)
            .policy(policy)
            .send()
            .await
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to set bucket policy: {}", e))
            })?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Service {
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .acl(aws_sdk_s3::types::ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| AppError::UploadFailure(e.to_string()))?;

        Ok(())
    }

    async fn put_file(&self, key: &str, path: &Path, content_type: &str) -> Result<(), AppError> {
        let body = ByteStream::from_path(path).await.map_err(|e| {
            AppError::UploadFailure(format!("could not open {}: {}", path.display(), e))
        })?;

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(body)
            .content_type(content_type)
            .acl(aws_sdk_s3::types::ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| AppError::UploadFailure(e.to_string()))?;

        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to delete file from S3: {}", e))
            })?;

        Ok(())
    }

    /// Public URL for a stored object. This exact string is what gets
    /// persisted on the video record.
    fn object_url(&self, key: &str) -> String {
        let config = get_config();
        if let Some(endpoint) = &config.s3_endpoint {
            format!("{}/{}/{}", endpoint, self.bucket_name, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket_name, config.aws_region, key
            )
        }
    }
}
