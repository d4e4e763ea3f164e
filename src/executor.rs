// ABOUTME: Pipeline executor boundary: the definition handed to the managed service and its writer.
// ABOUTME: Also a sequential reference runner that aborts on the first failing stage.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::plan::{Stage, StageGroup};
use crate::types::{BucketRef, EnvName, FunctionRef};

/// Everything the executor needs to run one environment's pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineDefinition {
    pub pipeline: String,
    pub environment: EnvName,
    pub pipelines: Vec<PipelineSpec>,
}

/// One function's pipeline: its stage groups in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSpec {
    pub function: FunctionRef,
    pub entry: String,
    pub bucket: BucketRef,
    pub groups: Vec<StageGroup>,
}

impl PipelineDefinition {
    pub fn stage_count(&self) -> usize {
        self.pipelines
            .iter()
            .flat_map(|p| p.groups.iter())
            .map(|g| g.stages.len())
            .sum()
    }
}

/// Acknowledgement from an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    /// Where the definition went (a path, or `stdout`).
    pub destination: String,
    pub pipelines: usize,
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("failed to write pipeline definition to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode pipeline definition: {0}")]
    Encode(String),
}

/// Accepts pipeline definitions for execution.
#[async_trait]
pub trait PipelineExecutor: Send + Sync {
    async fn submit(&self, definition: &PipelineDefinition) -> Result<Submission, ExecutorError>;
}

/// Serialization format for [`DefinitionWriter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DefinitionFormat {
    #[default]
    Json,
    Yaml,
}

/// Hands off by writing the definition to a file or stdout.
#[derive(Debug, Clone)]
pub struct DefinitionWriter {
    format: DefinitionFormat,
    out: Option<PathBuf>,
}

impl DefinitionWriter {
    pub fn new(format: DefinitionFormat) -> Self {
        Self { format, out: None }
    }

    pub fn to_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.out = Some(path.into());
        self
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }

    /// Render the definition in the configured format.
    pub fn render(&self, definition: &PipelineDefinition) -> Result<String, ExecutorError> {
        match self.format {
            DefinitionFormat::Json => serde_json::to_string_pretty(definition)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| ExecutorError::Encode(e.to_string())),
            DefinitionFormat::Yaml => {
                serde_yaml::to_string(definition).map_err(|e| ExecutorError::Encode(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl PipelineExecutor for DefinitionWriter {
    async fn submit(&self, definition: &PipelineDefinition) -> Result<Submission, ExecutorError> {
        let rendered = self.render(definition)?;

        let destination = match &self.out {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|source| ExecutorError::Write {
                            path: path.clone(),
                            source,
                        })?;
                }
                tokio::fs::write(path, rendered.as_bytes())
                    .await
                    .map_err(|source| ExecutorError::Write {
                        path: path.clone(),
                        source,
                    })?;
                path.display().to_string()
            }
            None => {
                let mut stdout = tokio::io::stdout();
                let written = async {
                    stdout.write_all(rendered.as_bytes()).await?;
                    stdout.flush().await
                };
                written.await.map_err(|source| ExecutorError::Write {
                    path: PathBuf::from("stdout"),
                    source,
                })?;
                "stdout".to_string()
            }
        };

        tracing::info!(
            pipeline = %definition.pipeline,
            environment = %definition.environment,
            destination = %destination,
            "pipeline definition handed off"
        );

        Ok(Submission {
            destination,
            pipelines: definition.pipelines.len(),
        })
    }
}

// =============================================================================
// Reference runner
// =============================================================================

/// Runs a single stage.
#[async_trait]
pub trait StageRunner: Send + Sync {
    async fn run_stage(&self, group: &str, stage: &Stage) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub group: String,
    pub stage: String,
    pub status: StageStatus,
}

/// Result of running every group of one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.stages
            .iter()
            .all(|s| s.status == StageStatus::Succeeded)
    }

    /// The stage that stopped the run, if any.
    pub fn failure(&self) -> Option<&StageReport> {
        self.stages
            .iter()
            .find(|s| matches!(s.status, StageStatus::Failed(_)))
    }
}

/// Run groups in order. After the first failure every later stage is skipped.
pub async fn run_groups<R: StageRunner + ?Sized>(groups: &[StageGroup], runner: &R) -> RunReport {
    let mut stages = Vec::new();
    let mut failed = false;

    for group in groups {
        for stage in group.stages.iter() {
            let status = if failed {
                StageStatus::Skipped
            } else {
                tracing::info!(group = %group.name, stage = %stage.name, "running stage");
                match runner.run_stage(&group.name, stage).await {
                    Ok(()) => StageStatus::Succeeded,
                    Err(reason) => {
                        tracing::warn!(group = %group.name, stage = %stage.name, "stage failed");
                        failed = true;
                        StageStatus::Failed(reason)
                    }
                }
            };

            stages.push(StageReport {
                group: group.name.clone(),
                stage: stage.name.clone(),
                status,
            });
        }
    }

    RunReport { stages }
}
