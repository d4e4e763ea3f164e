// ABOUTME: HTTP client for the credentials metadata endpoint.
// ABOUTME: One GET over a fresh HTTP/1 connection per fetch; no caching, no retries.

use async_trait::async_trait;
use http_body_util::{BodyExt, Empty};
use hyper::header::{AUTHORIZATION, HOST};
use hyper_util::rt::TokioIo;
use std::time::Duration;
use tokio::net::TcpStream;

use super::MetadataDocument;
use super::endpoint::MetadataEndpoint;
use super::error::CredentialFetchError;
use crate::exchange::CredentialSource;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches credential documents from a [`MetadataEndpoint`].
#[derive(Debug)]
pub struct MetadataClient {
    endpoint: MetadataEndpoint,
    timeout: Duration,
}

impl MetadataClient {
    pub fn new(endpoint: MetadataEndpoint) -> Self {
        Self {
            endpoint,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &MetadataEndpoint {
        &self.endpoint
    }

    async fn get(&self) -> Result<MetadataDocument, CredentialFetchError> {
        let endpoint = self.endpoint.to_string();
        let unreachable = |reason: String| CredentialFetchError::Unreachable {
            endpoint: endpoint.clone(),
            reason,
        };

        let stream = TcpStream::connect(self.endpoint.authority())
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| unreachable(format!("HTTP handshake failed: {e}")))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("metadata connection closed with error: {}", e);
            }
        });

        let mut request = hyper::Request::builder()
            .method("GET")
            .uri(self.endpoint.path())
            .header(HOST, self.endpoint.authority());
        if let Some(token) = self.endpoint.authorization() {
            request = request.header(AUTHORIZATION, token.expose());
        }
        let request = request
            .body(Empty::<bytes::Bytes>::new())
            .map_err(|_| CredentialFetchError::InvalidEndpoint(endpoint.clone()))?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| unreachable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CredentialFetchError::Status {
                endpoint: endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| unreachable(format!("failed to read response: {e}")))?;

        Ok(MetadataDocument::new(body.to_bytes()))
    }
}

#[async_trait]
impl CredentialSource for MetadataClient {
    async fn fetch(&self) -> Result<MetadataDocument, CredentialFetchError> {
        tracing::info!(endpoint = %self.endpoint, "fetching credentials");
        tokio::time::timeout(self.timeout, self.get())
            .await
            .map_err(|_| CredentialFetchError::Timeout {
                endpoint: self.endpoint.to_string(),
                millis: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }
}
