// ABOUTME: Collaborator traits for the Build stage: credential source, function updater, artifact store.
// ABOUTME: Also defines the update target and receipt passed across those seams.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::credentials::{CredentialFetchError, Credentials, MetadataDocument};
use crate::types::{ArtifactKey, BucketRef, FunctionRef};

/// Where the new code lives and which function should point at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateTarget {
    pub function: FunctionRef,
    pub bucket: BucketRef,
    pub key: ArtifactKey,
}

impl fmt::Display for UpdateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {}/{}", self.function, self.bucket, self.key)
    }
}

/// What the update call reported back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateReceipt {
    pub function: FunctionRef,
    pub code_sha256: Option<String>,
    pub revision_id: Option<String>,
}

/// Source of raw credential documents.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch one credentials document. Implementations must not retry.
    async fn fetch(&self) -> Result<MetadataDocument, CredentialFetchError>;
}

/// Repoints a deployed function's code at a stored artifact.
#[async_trait]
pub trait FunctionUpdater: Send + Sync {
    /// Issue exactly one update call. `credentials` are consumed by the call.
    async fn update_function_code(
        &self,
        credentials: Credentials,
        target: &UpdateTarget,
    ) -> Result<UpdateReceipt, UpdateCallError>;
}

/// Read-only view of the artifact object store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn object_exists(&self, bucket: &BucketRef, key: &ArtifactKey)
    -> Result<bool, ArtifactError>;
}

/// Errors from the function update call.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UpdateCallError {
    #[error("update of '{function}' rejected: {reason}")]
    Rejected { function: String, reason: String },

    #[error("update call failed: {0}")]
    Transport(String),
}

impl UpdateCallError {
    /// Apply `redact` to every free-text field.
    pub fn map_text(self, redact: impl Fn(&str) -> String) -> Self {
        match self {
            UpdateCallError::Rejected { function, reason } => UpdateCallError::Rejected {
                function,
                reason: redact(&reason),
            },
            UpdateCallError::Transport(reason) => UpdateCallError::Transport(redact(&reason)),
        }
    }
}

/// Errors from the artifact store.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("artifact {bucket}/{key} does not exist")]
    Missing { bucket: String, key: String },

    #[error("artifact store error: {0}")]
    Store(String),
}
