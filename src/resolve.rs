// ABOUTME: Artifact resolver: selects the functions to deploy for one environment.
// ABOUTME: Pure selection over a loaded deployment state, by name, all, or first-entry fallback.

use nonempty::NonEmpty;
use std::collections::BTreeSet;

use crate::diagnostics::{Diagnostics, Warning};
use crate::state::{DeploymentState, LambdaFunction};
use crate::types::EnvName;

/// Which functions of an environment to deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every configured function, in document order.
    All,
    /// The named functions, in the order they were first requested.
    /// Repeated names select the function once.
    Named(NonEmpty<String>),
    /// No identifier was given: use the first configured function.
    ///
    /// This exists for single-function environments. When more than one
    /// candidate exists the choice is recorded as a warning.
    FirstFallback,
}

impl Selection {
    /// Map CLI-style arguments onto a selection, dropping repeated names.
    pub fn from_args(names: Vec<String>, all: bool) -> Self {
        if all {
            return Selection::All;
        }
        let mut seen = BTreeSet::new();
        let names: Vec<String> = names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();
        match NonEmpty::from_vec(names) {
            Some(names) => Selection::Named(names),
            None => Selection::FirstFallback,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The environment has nothing configured but a deploy was requested.
    #[error("no functions configured for environment '{env}'")]
    NotFound { env: EnvName },

    /// A requested function name is not configured in the environment.
    #[error("function '{name}' is not configured for environment '{env}'")]
    UnknownFunction { env: EnvName, name: String },

    /// A selected function is missing a required field.
    #[error("function '{function}' in environment '{env}' is missing required field '{field}'")]
    Validation {
        env: EnvName,
        function: String,
        field: &'static str,
    },
}

impl ResolveError {
    /// True for both "nothing configured" and "no such function".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ResolveError::NotFound { .. } | ResolveError::UnknownFunction { .. }
        )
    }
}

/// Select the deployable functions for `env`.
///
/// Fails with `NotFound` when the environment is empty: an empty pipeline is
/// never produced silently.
pub fn resolve(
    state: &DeploymentState,
    env: EnvName,
    selection: &Selection,
    diag: &mut Diagnostics,
) -> Result<NonEmpty<LambdaFunction>, ResolveError> {
    let candidates = state.functions(env);
    if candidates.is_empty() {
        return Err(ResolveError::NotFound { env });
    }

    let selected: Vec<&LambdaFunction> = match selection {
        Selection::All => candidates.iter().collect(),
        Selection::Named(names) => {
            let mut seen = BTreeSet::new();
            names
                .iter()
                .filter(|name| seen.insert(name.as_str()))
                .map(|name| {
                    candidates
                        .iter()
                        .find(|f| &f.name == name)
                        .ok_or_else(|| ResolveError::UnknownFunction {
                            env,
                            name: name.clone(),
                        })
                })
                .collect::<Result<_, _>>()?
        }
        Selection::FirstFallback => {
            let first = &candidates[0];
            if candidates.len() > 1 {
                let others: Vec<&str> = candidates[1..].iter().map(|f| f.name.as_str()).collect();
                diag.warn(Warning::implicit_selection(format!(
                    "no function named for '{}'; deploying '{}' and ignoring {}",
                    env,
                    first.name,
                    others.join(", ")
                )));
            }
            vec![first]
        }
    };

    let mut resolved = Vec::with_capacity(selected.len());
    for function in selected {
        validate(env, function)?;
        resolved.push(function.clone());
    }

    tracing::debug!(%env, count = resolved.len(), "resolved functions");
    NonEmpty::from_vec(resolved).ok_or(ResolveError::NotFound { env })
}

fn validate(env: EnvName, function: &LambdaFunction) -> Result<(), ResolveError> {
    let missing = |field| ResolveError::Validation {
        env,
        function: function.name.clone(),
        field,
    };

    if function.artifact.trim().is_empty() {
        return Err(missing("artifact"));
    }
    if function.entry.trim().is_empty() {
        return Err(missing("entry"));
    }
    Ok(())
}
