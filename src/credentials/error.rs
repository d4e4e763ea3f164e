// ABOUTME: Errors raised while obtaining short-lived credentials.
// ABOUTME: Messages name the endpoint or the broken field, never document content.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialFetchError {
    #[error(
        "credentials endpoint not configured: set AWS_CONTAINER_CREDENTIALS_FULL_URI, \
         or AWS_CONTAINER_CREDENTIALS_RELATIVE_URI together with a metadata host"
    )]
    EndpointNotConfigured,

    #[error("invalid credentials endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("credentials endpoint {endpoint} unreachable: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("credentials endpoint {endpoint} did not respond within {millis}ms")]
    Timeout { endpoint: String, millis: u64 },

    #[error("credentials endpoint {endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("malformed credentials document: {0}")]
    Malformed(String),
}
