// ABOUTME: Application-wide error types for fnpipe.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::credentials::CredentialFetchError;
use crate::executor::ExecutorError;
use crate::exchange::ExchangeError;
use crate::plan::PlanError;
use crate::resolve::ResolveError;
use crate::state::StateError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("plan error: {0}")]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Credentials(#[from] CredentialFetchError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
