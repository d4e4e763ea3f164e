// ABOUTME: Update-code command: the entry point run inside the Build stage.
// ABOUTME: Runs the credential exchange from artifact check to the function update call.

use fnpipe::adapters::{LambdaUpdater, S3ArtifactStore};
use fnpipe::credentials::{MetadataClient, MetadataEndpoint};
use fnpipe::diagnostics::Diagnostics;
use fnpipe::error::{Error, Result};
use fnpipe::exchange::{self, ExchangeOutcome, ExchangeSteps, UpdateTarget};
use fnpipe::output::Output;
use fnpipe::plan::{FN_NAME_VAR, S3_BUCKET_KEY_VAR, S3_BUCKET_VAR};
use fnpipe::types::{ArtifactKey, BucketRef, FunctionRef};

#[derive(Debug, Clone)]
pub struct UpdateCodeArgs {
    pub function: String,
    pub bucket: String,
    pub key: String,
    pub region: Option<String>,
    pub metadata_host: Option<String>,
    pub check_only: bool,
    pub skip_artifact_check: bool,
}

impl UpdateCodeArgs {
    fn target(&self) -> Result<UpdateTarget> {
        for (var, value) in [
            (FN_NAME_VAR, &self.function),
            (S3_BUCKET_VAR, &self.bucket),
            (S3_BUCKET_KEY_VAR, &self.key),
        ] {
            if value.trim().is_empty() {
                return Err(Error::MissingEnvVar(var.to_string()));
            }
        }

        Ok(UpdateTarget {
            function: FunctionRef::new(&self.function),
            bucket: BucketRef::new(&self.bucket),
            key: ArtifactKey::new(&self.key),
        })
    }
}

pub async fn update_code(args: UpdateCodeArgs, mut output: Output) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();

    let target = args.target()?;
    let updater = if args.check_only {
        None
    } else {
        let region = args
            .region
            .clone()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| Error::MissingEnvVar("AWS_REGION".to_string()))?;
        Some(LambdaUpdater::new(region))
    };
    let client = MetadataClient::new(MetadataEndpoint::from_env(args.metadata_host.as_deref())?);
    let store = if args.skip_artifact_check {
        None
    } else {
        Some(S3ArtifactStore::from_env().await)
    };

    let mut steps = ExchangeSteps::new(&client);
    if let Some(store) = &store {
        steps = steps.verify_artifact(store);
    }
    if let Some(updater) = &updater {
        steps = steps.update(updater);
    }

    output.progress(&format!("Updating {target}"));
    let outcome = exchange::run_with(target, steps, &mut diag).await;
    output.warnings(&diag);

    match outcome {
        ExchangeOutcome::Completed(receipt) => output.success(&format!(
            "Updated {} (sha256 {})",
            receipt.function,
            receipt.code_sha256.as_deref().unwrap_or("unknown")
        )),
        ExchangeOutcome::Verified(function) => {
            output.success(&format!("Credentials valid for {function}; update skipped"))
        }
        ExchangeOutcome::Failed(e) => return Err(e.into()),
    }
    Ok(())
}
