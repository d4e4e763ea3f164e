// ABOUTME: Error types for plan construction and stage sequencing.
// ABOUTME: Every variant is raised before anything is handed to the executor.

use super::stage::StageKind;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    /// A stage consumes an artifact nothing before it produces.
    #[error("stage '{stage}' needs artifact '{input}' which no earlier stage produces")]
    UnsatisfiedInput { stage: String, input: String },

    /// Stages are not in Source, Build, Deploy order.
    #[error("stage '{stage}' ({kind}) must not run after a {after} stage")]
    OutOfOrder {
        stage: String,
        kind: StageKind,
        after: StageKind,
    },

    /// A stage group would contain no stages.
    #[error("stage group '{0}' has no stages")]
    EmptyGroup(String),

    /// A required plan parameter is empty.
    #[error("cannot build plan for '{function}': {field} is empty")]
    MissingParameter {
        function: String,
        field: &'static str,
    },

    /// The metadata host is not a bare `host[:port]`.
    #[error("metadata host '{0}' is not a valid host[:port]")]
    InvalidMetadataHost(String),
}
