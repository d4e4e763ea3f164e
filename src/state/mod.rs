// ABOUTME: Deployment state document: which function artifacts exist per environment.
// ABOUTME: Loaded once per invocation from JSON or YAML and validated before use.

mod error;

pub use error::StateError;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::types::EnvName;

/// The versioned description of deployable units, partitioned by environment.
///
/// All four environments must be present; unknown keys are rejected. The value
/// is immutable once loaded and is passed explicitly to whoever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentState {
    envs: Envs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Envs {
    dev: Env,
    qa: Env,
    stage: Env,
    prod: Env,
}

/// Functions configured for a single environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Env {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lambda_functions: Option<Vec<LambdaFunction>>,
}

/// A deployable unit.
///
/// `artifact` and `entry` are checked by the resolver for the functions it
/// selects, so a partially filled entry only fails when someone deploys it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaFunction {
    #[serde(default)]
    pub name: String,
    /// Opaque locator of the packaged code, e.g. an object-store key.
    #[serde(default)]
    pub artifact: String,
    /// Invocation entry point, e.g. `index.handler`.
    #[serde(default)]
    pub entry: String,
}

impl LambdaFunction {
    pub fn new(name: impl Into<String>, artifact: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artifact: artifact.into(),
            entry: entry.into(),
        }
    }
}

impl Env {
    pub fn new(functions: Vec<LambdaFunction>) -> Self {
        Self {
            lambda_functions: Some(functions),
        }
    }

    /// Configured functions, empty when the list is absent.
    pub fn functions(&self) -> &[LambdaFunction] {
        self.lambda_functions.as_deref().unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.functions().is_empty()
    }
}

impl DeploymentState {
    /// Build a state from per-environment values. Missing environments are empty.
    pub fn builder() -> DeploymentStateBuilder {
        DeploymentStateBuilder::default()
    }

    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let state: Self = serde_json::from_str(json)?;
        state.validate()?;
        Ok(state)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, StateError> {
        let state: Self = serde_yaml::from_str(yaml)?;
        state.validate()?;
        Ok(state)
    }

    /// Load from disk. `.yml`/`.yaml` files are parsed as YAML, everything else as JSON.
    pub fn load(path: &Path) -> Result<Self, StateError> {
        let content = std::fs::read_to_string(path).map_err(|source| StateError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"));

        let state = if is_yaml {
            Self::from_yaml(&content)?
        } else {
            Self::from_json(&content)?
        };

        tracing::debug!(path = %path.display(), "loaded deployment state");
        Ok(state)
    }

    pub fn env(&self, env: EnvName) -> &Env {
        match env {
            EnvName::Dev => &self.envs.dev,
            EnvName::Qa => &self.envs.qa,
            EnvName::Stage => &self.envs.stage,
            EnvName::Prod => &self.envs.prod,
        }
    }

    pub fn functions(&self, env: EnvName) -> &[LambdaFunction] {
        self.env(env).functions()
    }

    fn validate(&self) -> Result<(), StateError> {
        for env in EnvName::ALL {
            let mut seen = HashSet::new();
            for function in self.functions(env) {
                if function.name.trim().is_empty() {
                    return Err(StateError::UnnamedFunction { env });
                }
                if !seen.insert(function.name.as_str()) {
                    return Err(StateError::DuplicateFunction {
                        env,
                        name: function.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DeploymentStateBuilder {
    dev: Env,
    qa: Env,
    stage: Env,
    prod: Env,
}

impl DeploymentStateBuilder {
    pub fn env(mut self, name: EnvName, env: Env) -> Self {
        match name {
            EnvName::Dev => self.dev = env,
            EnvName::Qa => self.qa = env,
            EnvName::Stage => self.stage = env,
            EnvName::Prod => self.prod = env,
        }
        self
    }

    pub fn build(self) -> Result<DeploymentState, StateError> {
        let state = DeploymentState {
            envs: Envs {
                dev: self.dev,
                qa: self.qa,
                stage: self.stage,
                prod: self.prod,
            },
        };
        state.validate()?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATE_JSON: &str = r#"{
        "envs": {
            "dev": {
                "lambdaFunctions": [
                    { "name": "Greet", "artifact": "pkg-v1.zip", "entry": "index.handler" }
                ]
            },
            "qa": {},
            "stage": { "lambdaFunctions": [] },
            "prod": {}
        }
    }"#;

    #[test]
    fn parses_json_document() {
        let state = DeploymentState::from_json(STATE_JSON).unwrap();
        let dev = state.functions(EnvName::Dev);
        assert_eq!(dev.len(), 1);
        assert_eq!(dev[0], LambdaFunction::new("Greet", "pkg-v1.zip", "index.handler"));
    }

    #[test]
    fn absent_and_empty_lists_are_both_empty() {
        let state = DeploymentState::from_json(STATE_JSON).unwrap();
        assert!(state.env(EnvName::Qa).is_empty());
        assert!(state.env(EnvName::Stage).is_empty());
    }

    #[test]
    fn missing_environment_is_rejected() {
        let json = r#"{ "envs": { "dev": {}, "qa": {}, "stage": {} } }"#;
        let err = DeploymentState::from_json(json).unwrap_err();
        assert!(err.to_string().contains("prod"), "got: {err}");
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let json = r#"{ "envs": { "dev": {}, "qa": {}, "stage": {}, "prod": {}, "sandbox": {} } }"#;
        let err = DeploymentState::from_json(json).unwrap_err();
        assert!(err.to_string().contains("sandbox"), "got: {err}");
    }

    #[test]
    fn duplicate_function_names_are_rejected() {
        let json = r#"{ "envs": {
            "dev": { "lambdaFunctions": [
                { "name": "Greet", "artifact": "a.zip", "entry": "index.handler" },
                { "name": "Greet", "artifact": "b.zip", "entry": "index.handler" }
            ] },
            "qa": {}, "stage": {}, "prod": {}
        } }"#;
        let err = DeploymentState::from_json(json).unwrap_err();
        assert!(matches!(err, StateError::DuplicateFunction { env: EnvName::Dev, .. }));
    }

    #[test]
    fn unnamed_function_is_rejected() {
        let json = r#"{ "envs": {
            "dev": {}, "qa": {},
            "stage": { "lambdaFunctions": [ { "artifact": "a.zip", "entry": "index.handler" } ] },
            "prod": {}
        } }"#;
        let err = DeploymentState::from_json(json).unwrap_err();
        assert!(matches!(err, StateError::UnnamedFunction { env: EnvName::Stage }));
    }

    #[test]
    fn missing_artifact_is_accepted_at_load_time() {
        let json = r#"{ "envs": {
            "dev": { "lambdaFunctions": [ { "name": "Greet", "entry": "index.handler" } ] },
            "qa": {}, "stage": {}, "prod": {}
        } }"#;
        let state = DeploymentState::from_json(json).unwrap();
        assert!(state.functions(EnvName::Dev)[0].artifact.is_empty());
    }

    #[test]
    fn parses_yaml_document() {
        let yaml = r#"
envs:
  dev:
    lambdaFunctions:
      - name: Greet
        artifact: pkg-v1.zip
        entry: index.handler
  qa: {}
  stage: {}
  prod: {}
"#;
        let state = DeploymentState::from_yaml(yaml).unwrap();
        assert_eq!(state.functions(EnvName::Dev)[0].name, "Greet");
    }

    #[test]
    fn builder_fills_missing_environments() {
        let state = DeploymentState::builder()
            .env(EnvName::Prod, Env::new(vec![LambdaFunction::new("Greet", "a.zip", "h")]))
            .build()
            .unwrap();
        assert!(state.env(EnvName::Dev).is_empty());
        assert_eq!(state.functions(EnvName::Prod).len(), 1);
    }
}
