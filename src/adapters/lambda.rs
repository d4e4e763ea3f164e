// ABOUTME: FunctionUpdater backed by aws-sdk-lambda UpdateFunctionCode.
// ABOUTME: Builds a one-shot client from the exchanged credentials and drops it after the call.

use async_trait::async_trait;
use aws_sdk_lambda::config::{BehaviorVersion, Credentials as SdkCredentials, Region};
use aws_sdk_lambda::error::DisplayErrorContext;
use std::time::SystemTime;

use crate::credentials::Credentials;
use crate::exchange::{FunctionUpdater, UpdateCallError, UpdateReceipt, UpdateTarget};

const PROVIDER_NAME: &str = "fnpipe-metadata";

/// Updates function code in a single region.
#[derive(Debug, Clone)]
pub struct LambdaUpdater {
    region: String,
}

impl LambdaUpdater {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn client(&self, credentials: Credentials) -> aws_sdk_lambda::Client {
        let (access_key_id, secret_access_key, session_token, expiry) = credentials.into_parts();
        let provider = SdkCredentials::new(
            access_key_id,
            secret_access_key,
            session_token,
            expiry.map(SystemTime::from),
            PROVIDER_NAME,
        );

        let config = aws_sdk_lambda::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(provider)
            .build();

        aws_sdk_lambda::Client::from_conf(config)
    }
}

#[async_trait]
impl FunctionUpdater for LambdaUpdater {
    async fn update_function_code(
        &self,
        credentials: Credentials,
        target: &UpdateTarget,
    ) -> Result<UpdateReceipt, UpdateCallError> {
        let client = self.client(credentials);
        tracing::debug!(region = %self.region, target = %target, "calling UpdateFunctionCode");

        let output = client
            .update_function_code()
            .function_name(target.function.as_str())
            .s3_bucket(target.bucket.as_str())
            .s3_key(target.key.as_str())
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(_) => UpdateCallError::Rejected {
                    function: target.function.to_string(),
                    reason: DisplayErrorContext(&err).to_string(),
                },
                None => UpdateCallError::Transport(DisplayErrorContext(&err).to_string()),
            })?;

        Ok(UpdateReceipt {
            function: target.function.clone(),
            code_sha256: output.code_sha256().map(str::to_string),
            revision_id: output.revision_id().map(str::to_string),
        })
    }
}
