// ABOUTME: Config scaffolding for new pipelines.
// ABOUTME: Writes a commented fnpipe.yml template.

use std::path::Path;

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

/// Write a template config into `dir`. Refuses to overwrite unless `force`.
pub fn init_config(dir: &Path, pipeline: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let pipeline = pipeline.unwrap_or("my-pipeline");
    if pipeline.trim().is_empty() {
        return Err(Error::InvalidConfig("pipeline name cannot be empty".to_string()));
    }

    std::fs::write(&config_path, generate_template_yaml(pipeline))?;
    Ok(())
}

fn generate_template_yaml(pipeline: &str) -> String {
    format!(
        r#"pipeline: {pipeline}
state: deployment-state/deployment-state.json
artifact_bucket:
  env: ARTIFACT_BUCKET
  default: artifactory-bucket
source:
  owner: my-org
  repo: my-repo
  branch: main
  token_secret: github-token
# separate: Source, Build, Deploy groups. merged: Source, Buildeploy.
layout: separate
deploy:
  mechanism: direct-update
build:
  image: standard-7.0
  timeout: 10m
  # Run before `fnpipe update-code`; must put fnpipe on the image's PATH.
  # Use `install: []` when the image already ships it.
  install:
    - cargo install --locked fnpipe
# Only needed when the build container exposes a relative credentials URI.
# metadata_host:
#   env: FNPIPE_METADATA_HOST
environments:
  prod:
    layout: merged
"#
    )
}
