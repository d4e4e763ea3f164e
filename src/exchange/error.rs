// ABOUTME: Stage runner error with SNAFU context variants.
// ABOUTME: Unifies credential, update, and artifact failures for programmatic handling.

use snafu::Snafu;

use super::traits::{ArtifactError, UpdateCallError};
use crate::credentials::CredentialFetchError;

/// Terminal failure of a credential exchange run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ExchangeError {
    #[snafu(display("credential fetch failed: {source}"))]
    Fetch { source: CredentialFetchError },

    #[snafu(display("function update failed: {source}"))]
    Update { source: UpdateCallError },

    #[snafu(display("artifact check failed: {source}"))]
    Artifact { source: ArtifactError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeErrorKind {
    /// Endpoint missing, unreachable, slow, or answering with an error status.
    EndpointUnavailable,
    /// The endpoint answered but the document could not be used.
    MalformedCredentials,
    /// The update call was rejected or never reached the service.
    UpdateRejected,
    /// The artifact to deploy is not in the store.
    ArtifactMissing,
    /// The artifact store could not be queried.
    ArtifactStore,
}

impl ExchangeError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ExchangeErrorKind {
        match self {
            ExchangeError::Fetch { source } => match source {
                CredentialFetchError::Malformed(_) => ExchangeErrorKind::MalformedCredentials,
                CredentialFetchError::EndpointNotConfigured
                | CredentialFetchError::InvalidEndpoint(_)
                | CredentialFetchError::Unreachable { .. }
                | CredentialFetchError::Timeout { .. }
                | CredentialFetchError::Status { .. } => ExchangeErrorKind::EndpointUnavailable,
            },
            ExchangeError::Update { .. } => ExchangeErrorKind::UpdateRejected,
            ExchangeError::Artifact { source } => match source {
                ArtifactError::Missing { .. } => ExchangeErrorKind::ArtifactMissing,
                ArtifactError::Store(_) => ExchangeErrorKind::ArtifactStore,
            },
        }
    }
}

impl From<CredentialFetchError> for ExchangeError {
    fn from(source: CredentialFetchError) -> Self {
        ExchangeError::Fetch { source }
    }
}

impl From<UpdateCallError> for ExchangeError {
    fn from(source: UpdateCallError) -> Self {
        ExchangeError::Update { source }
    }
}

impl From<ArtifactError> for ExchangeError {
    fn from(source: ArtifactError) -> Self {
        ExchangeError::Artifact { source }
    }
}
