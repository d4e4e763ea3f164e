// ABOUTME: Short-lived credentials obtained from a local metadata endpoint.
// ABOUTME: Parsing, redaction, and the HTTP client that fetches the raw document.

mod client;
mod endpoint;
mod error;
mod secret;

pub use client::MetadataClient;
pub use endpoint::{AUTHORIZATION_TOKEN_VAR, FULL_URI_VAR, MetadataEndpoint, RELATIVE_URI_VAR};
pub use error::CredentialFetchError;
pub use secret::{Redactor, Secret};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Raw response body from the metadata endpoint. Opaque until parsed.
pub struct MetadataDocument(Bytes);

impl MetadataDocument {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self(body.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for MetadataDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataDocument({} bytes)", self.0.len())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawCredentials {
    access_key_id: Option<String>,
    secret_access_key: Option<String>,
    token: Option<String>,
    expiration: Option<DateTime<Utc>>,
}

/// Key material for exactly one privileged call.
///
/// Not `Clone`: the value moves into the call that uses it and is dropped there.
#[derive(Debug)]
pub struct Credentials {
    access_key_id: Secret,
    secret_access_key: Secret,
    session_token: Option<Secret>,
    expiry: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn new(
        access_key_id: Secret,
        secret_access_key: Secret,
        session_token: Option<Secret>,
        expiry: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            session_token,
            expiry,
        }
    }

    /// Extract credentials from a metadata document.
    ///
    /// Error messages carry only a position or a field name, never content.
    pub fn from_document(document: &MetadataDocument) -> Result<Self, CredentialFetchError> {
        let raw: RawCredentials = serde_json::from_slice(&document.0).map_err(|e| {
            CredentialFetchError::Malformed(format!(
                "{:?} error at line {} column {}",
                e.classify(),
                e.line(),
                e.column()
            ))
        })?;

        let required = |value: Option<String>, field: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(Secret::new)
                .ok_or_else(|| CredentialFetchError::Malformed(format!("missing {field}")))
        };

        Ok(Self {
            access_key_id: required(raw.access_key_id, "AccessKeyId")?,
            secret_access_key: required(raw.secret_access_key, "SecretAccessKey")?,
            session_token: raw.token.filter(|t| !t.is_empty()).map(Secret::new),
            expiry: raw.expiration,
        })
    }

    pub fn access_key_id(&self) -> &Secret {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &Secret {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&Secret> {
        self.session_token.as_ref()
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    /// A redactor for every credential value, usable after `self` is consumed.
    pub fn redactor(&self) -> Redactor {
        let mut secrets = vec![
            Secret::new(self.secret_access_key.expose()),
            Secret::new(self.access_key_id.expose()),
        ];
        if let Some(token) = &self.session_token {
            secrets.push(Secret::new(token.expose()));
        }
        Redactor::new(secrets)
    }

    /// Split into exposed parts for the SDK call that consumes them.
    pub fn into_parts(self) -> (String, String, Option<String>, Option<DateTime<Utc>>) {
        (
            self.access_key_id.into_exposed(),
            self.secret_access_key.into_exposed(),
            self.session_token.map(Secret::into_exposed),
            self.expiry,
        )
    }
}
