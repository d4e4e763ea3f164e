// ABOUTME: Error types for loading the deployment state document.
// ABOUTME: Schema violations abort before any plan is built.

use std::path::PathBuf;

use crate::types::EnvName;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to read deployment state {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("deployment state is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("deployment state is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("deployment state for '{env}' has a function without a name")]
    UnnamedFunction { env: EnvName },

    #[error("deployment state for '{env}' declares function '{name}' more than once")]
    DuplicateFunction { env: EnvName, name: String },
}
