// ABOUTME: ArtifactStore backed by S3 HeadObject.
// ABOUTME: Uses the ambient role from the default provider chain, never exchanged credentials.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;

use crate::exchange::{ArtifactError, ArtifactStore};
use crate::types::{ArtifactKey, BucketRef};

/// Looks up artifact objects in S3.
#[derive(Debug, Clone)]
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
}

impl S3ArtifactStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build a store from the default configuration chain.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_s3::Client::new(&config))
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn object_exists(
        &self,
        bucket: &BucketRef,
        key: &ArtifactKey,
    ) -> Result<bool, ArtifactError> {
        match self
            .client
            .head_object()
            .bucket(bucket.as_str())
            .key(key.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(ArtifactError::Store(DisplayErrorContext(&err).to_string())),
        }
    }
}
