use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::{debug, info};

use super::BlobStore;
use crate::config::StorageConfig;
use crate::types::{AppError, AppResult};

pub struct S3Storage {
    bucket: Bucket,
    public_base: String,
}

impl S3Storage {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let region = match &config.s3_endpoint {
            Some(endpoint) => Region::Custom {
                region: config.s3_region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config.s3_region.parse()?,
        };

        // With no explicit keys this falls back to the ambient credential chain
        let credentials = Credentials::new(
            config.s3_access_key_id.as_deref(),
            config.s3_secret_access_key.as_deref(),
            None,
            None,
            None,
        )?;

        let mut bucket = Bucket::new(&config.s3_bucket, region, credentials)?;
        if config.s3_endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        info!(bucket = %config.s3_bucket, region = %config.s3_region, "S3 storage initialised");

        Ok(Self {
            bucket,
            public_base: config.public_base(),
        })
    }
}

#[async_trait]
impl BlobStore for S3Storage {
    fn public_url(&self, key: &str) -> String {
        super::public_url(&self.public_base, key)
    }

    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<String> {
        debug!(key, size = data.len(), content_type, "Uploading object");

        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(AppError::Upload(format!(
                "S3 returned status {} for key {}",
                status, key
            )));
        }

        Ok(self.public_url(key))
    }
}
