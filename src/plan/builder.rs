// ABOUTME: Pipeline plan builder: compiles Source, Build, and Deploy stages for one function.
// ABOUTME: Every stage parameter is threaded from the resolved function, never hardcoded.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::deploy::DeployMechanism;
use super::error::PlanError;
use super::stage::{ArtifactRef, SourceSpec, Stage, StageAction, StageKind, StagePlan};
use crate::state::LambdaFunction;
use crate::types::{ArtifactKey, BucketRef, FunctionRef};

/// Build stage variable naming the target function.
pub const FN_NAME_VAR: &str = "FN_NAME";
/// Build stage variable naming the artifact bucket.
pub const S3_BUCKET_VAR: &str = "S3_BUCKET";
/// Build stage variable naming the artifact key.
pub const S3_BUCKET_KEY_VAR: &str = "S3_BUCKET_KEY";

/// Command run inside the build container.
const BUILD_COMMAND: &str = "fnpipe update-code";

/// Installs the build command into a stock build image.
pub const DEFAULT_INSTALL_COMMAND: &str = "cargo install --locked fnpipe";

/// Build container settings shared by every plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub image: String,
    pub timeout: Duration,
    /// Commands run before the build command; they must put `fnpipe` on the
    /// image's PATH. Empty when the image already ships it.
    pub install: Vec<String>,
    /// Metadata endpoint host passed to the build command, when the build
    /// environment only exposes a relative credentials URI.
    pub metadata_host: Option<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            image: "standard-7.0".to_string(),
            timeout: Duration::from_secs(600),
            install: vec![DEFAULT_INSTALL_COMMAND.to_string()],
            metadata_host: None,
        }
    }
}

/// Compiles stage plans. Holds only pipeline-wide settings; everything
/// function-specific comes in through [`PlanBuilder::build`].
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    source: SourceSpec,
    mechanism: DeployMechanism,
    build: BuildSettings,
}

impl PlanBuilder {
    pub fn new(source: SourceSpec, mechanism: DeployMechanism) -> Self {
        Self {
            source,
            mechanism,
            build: BuildSettings::default(),
        }
    }

    pub fn with_build(mut self, build: BuildSettings) -> Self {
        self.build = build;
        self
    }

    pub fn mechanism(&self) -> &DeployMechanism {
        &self.mechanism
    }

    /// Build the three-stage plan deploying `function`'s artifact to `target`.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::MissingParameter` when the artifact, bucket, or target
    /// is empty, and `PlanError::InvalidMetadataHost` for a host that is not
    /// `host[:port]`.
    pub fn build(
        &self,
        function: &LambdaFunction,
        bucket: &BucketRef,
        target: &FunctionRef,
    ) -> Result<StagePlan, PlanError> {
        let missing = |field| PlanError::MissingParameter {
            function: function.name.clone(),
            field,
        };
        if function.artifact.trim().is_empty() {
            return Err(missing("artifact"));
        }
        if bucket.is_empty() {
            return Err(missing("bucket"));
        }
        if target.is_empty() {
            return Err(missing("target function"));
        }
        if let Some(host) = &self.build.metadata_host {
            validate_metadata_host(host)?;
        }

        let key = ArtifactKey::new(function.artifact.clone());
        let stages = vec![
            self.source_stage(),
            self.build_stage(target, bucket, &key),
            self.deploy_stage(target, bucket, &key),
        ];

        let plan = StagePlan::new(target.clone(), bucket.clone(), stages)?;
        tracing::debug!(
            function = %target,
            bucket = %bucket,
            key = %key,
            "built stage plan"
        );
        Ok(plan)
    }

    fn source_stage(&self) -> Stage {
        Stage {
            name: "Checkout".to_string(),
            kind: StageKind::Source,
            inputs: BTreeSet::new(),
            outputs: BTreeSet::from([ArtifactRef::source()]),
            env: BTreeMap::new(),
            action: StageAction::Checkout(self.source.clone()),
        }
    }

    fn build_stage(&self, target: &FunctionRef, bucket: &BucketRef, key: &ArtifactKey) -> Stage {
        let mut command = BUILD_COMMAND.to_string();
        if !self.mechanism.updates_during_build() {
            // Another stage applies the artifact; Build only proves it exists.
            command.push_str(" --check-only");
        }
        if let Some(host) = &self.build.metadata_host {
            command.push_str(&format!(" --metadata-host {host}"));
        }

        Stage {
            name: "UpdateCode".to_string(),
            kind: StageKind::Build,
            inputs: BTreeSet::from([ArtifactRef::source()]),
            outputs: BTreeSet::from([ArtifactRef::build()]),
            env: BTreeMap::from([
                (FN_NAME_VAR.to_string(), target.to_string()),
                (S3_BUCKET_VAR.to_string(), bucket.to_string()),
                (S3_BUCKET_KEY_VAR.to_string(), key.to_string()),
            ]),
            action: StageAction::CredentialExchange {
                image: self.build.image.clone(),
                timeout_secs: self.build.timeout.as_secs(),
                commands: self
                    .build
                    .install
                    .iter()
                    .cloned()
                    .chain(std::iter::once(command))
                    .collect(),
            },
        }
    }

    fn deploy_stage(&self, target: &FunctionRef, bucket: &BucketRef, key: &ArtifactKey) -> Stage {
        Stage {
            name: "Deploy".to_string(),
            kind: StageKind::Deploy,
            inputs: BTreeSet::from([ArtifactRef::build()]),
            outputs: BTreeSet::new(),
            env: BTreeMap::new(),
            action: StageAction::Deploy(self.mechanism.action(target, bucket, key)),
        }
    }
}

/// Check that `host` is a bare `host[:port]`, optionally prefixed with
/// `http://`. The value is spliced into a shell command line.
pub fn validate_metadata_host(host: &str) -> Result<(), PlanError> {
    let bare = host.trim_start_matches("http://").trim_end_matches('/');
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']');
    if bare.is_empty() || !bare.chars().all(allowed) {
        return Err(PlanError::InvalidMetadataHost(host.to_string()));
    }
    Ok(())
}
