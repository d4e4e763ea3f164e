// ABOUTME: Configuration values that may come from environment variables.
// ABOUTME: A plain literal, or { env: NAME, default: VALUE } resolved at use time.

use crate::error::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn literal(value: impl Into<String>) -> Self {
        EnvValue::Literal(value.into())
    }

    /// Resolve to a concrete value. An unset variable falls back to `default`.
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }

    /// Like [`resolve`](Self::resolve), but an unset variable with no default is `None`.
    pub fn resolve_optional(&self) -> Option<String> {
        self.resolve().ok().filter(|v| !v.is_empty())
    }
}
