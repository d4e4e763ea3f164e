// ABOUTME: Pipeline plan construction: stages, deploy mechanisms, and stage grouping.
// ABOUTME: Plans are built once per resolved function and never mutated afterwards.

mod builder;
mod deploy;
mod error;
mod sequencer;
mod stage;

pub use builder::{
    BuildSettings, DEFAULT_INSTALL_COMMAND, FN_NAME_VAR, PlanBuilder, S3_BUCKET_KEY_VAR,
    S3_BUCKET_VAR, validate_metadata_host,
};
pub use deploy::{DeployAction, DeployMechanism};
pub use error::PlanError;
pub use sequencer::{StageGroup, StageLayout, sequence};
pub use stage::{ArtifactRef, SourceSpec, Stage, StageAction, StageKind, StagePlan};
