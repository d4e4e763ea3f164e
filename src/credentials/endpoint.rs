// ABOUTME: Location of the local credentials metadata endpoint.
// ABOUTME: Supplied by the execution environment as a full URI or host plus relative path.

use hyper::Uri;
use std::fmt;

use super::error::CredentialFetchError;
use super::secret::Secret;

pub const FULL_URI_VAR: &str = "AWS_CONTAINER_CREDENTIALS_FULL_URI";
pub const RELATIVE_URI_VAR: &str = "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI";
pub const AUTHORIZATION_TOKEN_VAR: &str = "AWS_CONTAINER_AUTHORIZATION_TOKEN";

/// An HTTP endpoint serving a credentials document.
#[derive(Debug)]
pub struct MetadataEndpoint {
    host: String,
    port: u16,
    path: String,
    authorization: Option<Secret>,
}

impl MetadataEndpoint {
    /// Parse an absolute `http://` URI.
    pub fn parse(uri: &str) -> Result<Self, CredentialFetchError> {
        let invalid = || CredentialFetchError::InvalidEndpoint(uri.to_string());
        let parsed: Uri = uri.parse().map_err(|_| invalid())?;

        if parsed.scheme_str() != Some("http") {
            return Err(invalid());
        }
        let host = parsed.host().filter(|h| !h.is_empty()).ok_or_else(invalid)?;

        Ok(Self {
            host: host.to_string(),
            port: parsed.port_u16().unwrap_or(80),
            path: parsed
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string()),
            authorization: None,
        })
    }

    /// Choose the endpoint from explicit values.
    ///
    /// A full URI wins; otherwise the relative URI is joined onto `host`.
    pub fn resolve(
        full_uri: Option<&str>,
        relative_uri: Option<&str>,
        host: Option<&str>,
    ) -> Result<Self, CredentialFetchError> {
        fn non_empty(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }

        if let Some(full) = non_empty(full_uri) {
            return Self::parse(full);
        }

        match (non_empty(relative_uri), non_empty(host)) {
            (Some(relative), Some(host)) => {
                let host = host
                    .trim_start_matches("http://")
                    .trim_end_matches('/');
                let relative = relative.trim_start_matches('/');
                Self::parse(&format!("http://{host}/{relative}"))
            }
            _ => Err(CredentialFetchError::EndpointNotConfigured),
        }
    }

    /// Read the endpoint from the process environment.
    ///
    /// `metadata_host` is only consulted when no full URI is set.
    pub fn from_env(metadata_host: Option<&str>) -> Result<Self, CredentialFetchError> {
        let full = std::env::var(FULL_URI_VAR).ok();
        let relative = std::env::var(RELATIVE_URI_VAR).ok();
        let endpoint = Self::resolve(full.as_deref(), relative.as_deref(), metadata_host)?;

        Ok(match std::env::var(AUTHORIZATION_TOKEN_VAR) {
            Ok(token) if !token.is_empty() => endpoint.with_authorization(Secret::new(token)),
            _ => endpoint,
        })
    }

    pub fn with_authorization(mut self, token: Secret) -> Self {
        self.authorization = Some(token);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn authorization(&self) -> Option<&Secret> {
        self.authorization.as_ref()
    }

    /// `host:port`, as used for the TCP connection and the Host header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for MetadataEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}:{}{}", self.host, self.port, self.path)
    }
}
