// ABOUTME: Closed set of deployment environment names.
// ABOUTME: Parsing rejects anything outside dev, qa, stage, and prod.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown environment '{0}' (expected one of: dev, qa, stage, prod)")]
pub struct UnknownEnvironment(pub String);

/// A deployment environment. The set is fixed and exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvName {
    Dev,
    Qa,
    Stage,
    Prod,
}

impl EnvName {
    pub const ALL: [EnvName; 4] = [EnvName::Dev, EnvName::Qa, EnvName::Stage, EnvName::Prod];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvName::Dev => "dev",
            EnvName::Qa => "qa",
            EnvName::Stage => "stage",
            EnvName::Prod => "prod",
        }
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvName {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvName::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| UnknownEnvironment(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_environments() {
        for env in EnvName::ALL {
            assert_eq!(env.as_str().parse::<EnvName>(), Ok(env));
        }
    }

    #[test]
    fn rejects_unknown_environment() {
        let err = "staging".parse::<EnvName>().unwrap_err();
        assert_eq!(err, UnknownEnvironment("staging".to_string()));
        assert!(err.to_string().contains("staging"));
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("Prod".parse::<EnvName>().is_err());
    }
}
