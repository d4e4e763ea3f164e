// ABOUTME: Stage and stage plan types with their declared artifact chain.
// ABOUTME: A StagePlan can only be constructed when every input is produced upstream.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::deploy::DeployAction;
use super::error::PlanError;
use crate::types::{BucketRef, FunctionRef};

/// A named artifact passed between stages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Output of the Source stage.
    pub fn source() -> Self {
        Self::new("source")
    }

    /// Output of the Build stage.
    pub fn build() -> Self {
        Self::new("build")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StageKind {
    Source,
    Build,
    Deploy,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Source => write!(f, "Source"),
            StageKind::Build => write!(f, "Build"),
            StageKind::Deploy => write!(f, "Deploy"),
        }
    }
}

/// Repository checked out by the Source stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSpec {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Name of the secret holding the checkout token. The token itself never
    /// passes through the orchestrator.
    pub token_secret: String,
}

/// What the executor does when it runs a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageAction {
    Checkout(SourceSpec),
    CredentialExchange {
        image: String,
        timeout_secs: u64,
        commands: Vec<String>,
    },
    Deploy(DeployAction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub name: String,
    pub kind: StageKind,
    pub inputs: BTreeSet<ArtifactRef>,
    pub outputs: BTreeSet<ArtifactRef>,
    pub env: BTreeMap<String, String>,
    pub action: StageAction,
}

/// Ordered stages for deploying one function. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePlan {
    function: FunctionRef,
    bucket: BucketRef,
    stages: Vec<Stage>,
}

impl StagePlan {
    /// Create a plan, checking kind order and the artifact chain.
    ///
    /// Stage `i` may only consume artifacts produced by stages `0..i`.
    pub fn new(
        function: FunctionRef,
        bucket: BucketRef,
        stages: Vec<Stage>,
    ) -> Result<Self, PlanError> {
        let mut available: BTreeSet<&ArtifactRef> = BTreeSet::new();
        let mut previous: Option<StageKind> = None;

        for stage in &stages {
            if let Some(after) = previous
                && stage.kind < after
            {
                return Err(PlanError::OutOfOrder {
                    stage: stage.name.clone(),
                    kind: stage.kind,
                    after,
                });
            }

            if let Some(missing) = stage.inputs.iter().find(|input| !available.contains(input)) {
                return Err(PlanError::UnsatisfiedInput {
                    stage: stage.name.clone(),
                    input: missing.to_string(),
                });
            }

            available.extend(stage.outputs.iter());
            previous = Some(stage.kind);
        }

        Ok(Self {
            function,
            bucket,
            stages,
        })
    }

    pub fn function(&self) -> &FunctionRef {
        &self.function
    }

    pub fn bucket(&self) -> &BucketRef {
        &self.bucket
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// First stage of the given kind.
    pub fn stage(&self, kind: StageKind) -> Option<&Stage> {
        self.stages.iter().find(|s| s.kind == kind)
    }
}
