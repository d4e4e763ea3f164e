// ABOUTME: Integration tests for the credential exchange against a loopback metadata endpoint.
// ABOUTME: Covers fetch failures, malformed documents, and secrets leaking into logs or errors.

use async_trait::async_trait;
use fnpipe::credentials::{
    CredentialFetchError, Credentials, MetadataClient, MetadataEndpoint, Secret,
};
use fnpipe::exchange::{
    self, Exchange, ExchangeErrorKind, FunctionUpdater, UpdateCallError, UpdateReceipt,
    UpdateTarget,
};
use fnpipe::types::{ArtifactKey, BucketRef, FunctionRef};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const ACCESS_KEY: &str = "AKIAINTEGRATIONTEST";
const SECRET_KEY: &str = "integration/secret+key/value";
const SESSION_TOKEN: &str = "integration-session-token";

fn valid_document() -> String {
    format!(
        r#"{{"AccessKeyId":"{ACCESS_KEY}","SecretAccessKey":"{SECRET_KEY}","Token":"{SESSION_TOKEN}","Expiration":"2099-01-01T00:00:00Z"}}"#
    )
}

fn target() -> UpdateTarget {
    UpdateTarget {
        function: FunctionRef::new("Greet"),
        bucket: BucketRef::new("artifactory-bucket"),
        key: ArtifactKey::new("pkg-v1.zip"),
    }
}

/// Serve a single HTTP response and return the captured request head.
async fn serve_once(status: &'static str, body: String) -> (MetadataEndpoint, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&request).into_owned()
    });

    let endpoint = MetadataEndpoint::parse(&format!("http://{addr}/v2/credentials/build")).unwrap();
    (endpoint, handle)
}

#[derive(Default)]
struct RecordingUpdater {
    calls: AtomicUsize,
    reject_with_secret: bool,
}

#[async_trait]
impl FunctionUpdater for RecordingUpdater {
    async fn update_function_code(
        &self,
        credentials: Credentials,
        target: &UpdateTarget,
    ) -> Result<UpdateReceipt, UpdateCallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_with_secret {
            return Err(UpdateCallError::Transport(format!(
                "request signed with {} / {} / {:?} failed",
                credentials.access_key_id().expose(),
                credentials.secret_access_key().expose(),
                credentials.session_token().map(Secret::expose)
            )));
        }
        Ok(UpdateReceipt {
            function: target.function.clone(),
            code_sha256: Some("c2hhMjU2".to_string()),
            revision_id: Some("rev-1".to_string()),
        })
    }
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

fn assert_no_secrets(text: &str) {
    for secret in [ACCESS_KEY, SECRET_KEY, SESSION_TOKEN] {
        assert!(!text.contains(secret), "found {secret} in: {text}");
    }
}

#[tokio::test]
async fn successful_exchange_updates_once() {
    let (endpoint, server) = serve_once("200 OK", valid_document()).await;
    let updater = RecordingUpdater::default();

    let receipt = exchange::run(target(), &MetadataClient::new(endpoint), &updater)
        .await
        .into_result()
        .unwrap()
        .expect("update call made");

    assert_eq!(receipt.revision_id.as_deref(), Some("rev-1"));
    assert_eq!(updater.calls.load(Ordering::SeqCst), 1);
    assert!(server.await.unwrap().starts_with("GET /v2/credentials/build HTTP/1.1"));
}

#[tokio::test]
async fn authorization_token_is_sent() {
    let (endpoint, server) = serve_once("200 OK", valid_document()).await;
    let client = MetadataClient::new(endpoint.with_authorization(Secret::new("auth-token-value")));

    Exchange::new(target()).fetch(&client).await.unwrap();

    let request = server.await.unwrap().to_ascii_lowercase();
    assert!(request.contains("authorization: auth-token-value"));
}

#[tokio::test]
async fn malformed_json_fails_before_update() {
    let (endpoint, _server) = serve_once("200 OK", "<html>not json</html>".to_string()).await;
    let updater = RecordingUpdater::default();

    let err = exchange::run(target(), &MetadataClient::new(endpoint), &updater)
        .await
        .into_result()
        .unwrap_err();

    assert_eq!(err.kind(), ExchangeErrorKind::MalformedCredentials);
    assert_eq!(updater.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn error_status_is_reported() {
    let (endpoint, _server) = serve_once("404 Not Found", String::new()).await;

    let err = Exchange::new(target())
        .fetch(&MetadataClient::new(endpoint))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ExchangeErrorKind::EndpointUnavailable);
    assert!(err.to_string().contains("HTTP 404"), "got: {err}");
}

#[tokio::test]
async fn unreachable_endpoint_is_reported() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let endpoint = MetadataEndpoint::parse(&format!("http://{addr}/creds")).unwrap();

    let err = Exchange::new(target())
        .fetch(&MetadataClient::new(endpoint))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        fnpipe::exchange::ExchangeError::Fetch {
            source: CredentialFetchError::Unreachable { .. }
        }
    ));
}

#[tokio::test]
async fn silent_endpoint_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    let endpoint = MetadataEndpoint::parse(&format!("http://{addr}/creds")).unwrap();
    let client = MetadataClient::new(endpoint).with_timeout(Duration::from_millis(200));

    let err = Exchange::new(target()).fetch(&client).await.unwrap_err();

    assert!(matches!(
        err,
        fnpipe::exchange::ExchangeError::Fetch {
            source: CredentialFetchError::Timeout { millis: 200, .. }
        }
    ));
    assert!(err.to_string().contains("within 200ms"), "got: {err}");
}

#[tokio::test]
async fn secrets_never_reach_logs_on_success() {
    let (logs, _guard) = capture_logs();
    let (endpoint, _server) = serve_once("200 OK", valid_document()).await;

    exchange::run(target(), &MetadataClient::new(endpoint), &RecordingUpdater::default())
        .await
        .into_result()
        .unwrap()
        .expect("update call made");

    let text = logs.text();
    assert!(text.contains("credentials extracted"), "got: {text}");
    assert!(text.contains("function code updated"), "got: {text}");
    assert_no_secrets(&text);
}

#[tokio::test]
async fn secrets_never_reach_logs_or_errors_on_rejection() {
    let (logs, _guard) = capture_logs();
    let (endpoint, _server) = serve_once("200 OK", valid_document()).await;
    let updater = RecordingUpdater {
        reject_with_secret: true,
        ..RecordingUpdater::default()
    };

    let err = exchange::run(target(), &MetadataClient::new(endpoint), &updater)
        .await
        .into_result()
        .unwrap_err();

    assert_eq!(err.kind(), ExchangeErrorKind::UpdateRejected);
    assert_no_secrets(&err.to_string());
    assert_no_secrets(&format!("{err:?}"));

    let text = logs.text();
    assert!(text.contains("credential exchange failed"), "got: {text}");
    assert_no_secrets(&text);
}
