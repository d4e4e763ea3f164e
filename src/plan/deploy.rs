// ABOUTME: Deploy stage variants: direct code update, template stack update, or deployer invoke.
// ABOUTME: One mechanism is configured per pipeline and parameterized by the resolved function.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{ArtifactKey, BucketRef, FunctionRef};

/// How the Deploy stage applies a new artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mechanism", rename_all = "kebab-case")]
pub enum DeployMechanism {
    /// The Build stage updates the function code; Deploy only marks completion.
    #[default]
    DirectUpdate,

    /// Deploy updates a template-based stack whose parameters point at the artifact.
    StackUpdate {
        stack_name: String,
        template_path: String,
    },

    /// Deploy invokes a deployer function that performs the update.
    Invoke { deployer: String },
}

impl DeployMechanism {
    /// Whether the Build stage itself mutates the target function.
    pub fn updates_during_build(&self) -> bool {
        matches!(self, DeployMechanism::DirectUpdate)
    }

    /// Concrete Deploy stage action for one function and artifact.
    pub fn action(
        &self,
        function: &FunctionRef,
        bucket: &BucketRef,
        key: &ArtifactKey,
    ) -> DeployAction {
        match self {
            DeployMechanism::DirectUpdate => DeployAction::Marker,
            DeployMechanism::StackUpdate {
                stack_name,
                template_path,
            } => DeployAction::StackUpdate {
                stack_name: stack_name.clone(),
                template_path: template_path.clone(),
                parameter_overrides: BTreeMap::from([
                    ("LambdaFunctionName".to_string(), function.to_string()),
                    ("LambdaFunctionCodeBucket".to_string(), bucket.to_string()),
                    ("LambdaFunctionCodeKey".to_string(), key.to_string()),
                ]),
            },
            DeployMechanism::Invoke { deployer } => DeployAction::Invoke {
                deployer: deployer.clone(),
                payload: BTreeMap::from([
                    ("FunctionName".to_string(), function.to_string()),
                    ("S3Bucket".to_string(), bucket.to_string()),
                    ("S3Key".to_string(), key.to_string()),
                ]),
            },
        }
    }
}

/// Deploy stage work handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mechanism", rename_all = "kebab-case")]
pub enum DeployAction {
    /// Nothing to do: the mutation already happened during Build.
    Marker,
    StackUpdate {
        stack_name: String,
        template_path: String,
        parameter_overrides: BTreeMap<String, String>,
    },
    Invoke {
        deployer: String,
        payload: BTreeMap<String, String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs() -> (FunctionRef, BucketRef, ArtifactKey) {
        (
            FunctionRef::new("Greet"),
            BucketRef::new("artifacts"),
            ArtifactKey::new("pkg-v1.zip"),
        )
    }

    #[test]
    fn direct_update_is_marker() {
        let (f, b, k) = refs();
        assert_eq!(DeployMechanism::DirectUpdate.action(&f, &b, &k), DeployAction::Marker);
        assert!(DeployMechanism::DirectUpdate.updates_during_build());
    }

    #[test]
    fn stack_update_overrides_point_at_artifact() {
        let (f, b, k) = refs();
        let mechanism = DeployMechanism::StackUpdate {
            stack_name: "GreetStack".to_string(),
            template_path: "template.yaml".to_string(),
        };
        assert!(!mechanism.updates_during_build());

        let DeployAction::StackUpdate {
            parameter_overrides,
            ..
        } = mechanism.action(&f, &b, &k)
        else {
            panic!("expected stack update");
        };
        assert_eq!(parameter_overrides["LambdaFunctionName"], "Greet");
        assert_eq!(parameter_overrides["LambdaFunctionCodeBucket"], "artifacts");
        assert_eq!(parameter_overrides["LambdaFunctionCodeKey"], "pkg-v1.zip");
    }

    #[test]
    fn invoke_payload_names_target() {
        let (f, b, k) = refs();
        let mechanism = DeployMechanism::Invoke {
            deployer: "Deployer".to_string(),
        };
        let DeployAction::Invoke { deployer, payload } = mechanism.action(&f, &b, &k) else {
            panic!("expected invoke");
        };
        assert_eq!(deployer, "Deployer");
        assert_eq!(payload["S3Key"], "pkg-v1.zip");
    }

    #[test]
    fn mechanism_parses_from_yaml() {
        let mechanism: DeployMechanism = serde_yaml::from_str(
            "mechanism: stack-update\nstack_name: GreetStack\ntemplate_path: template.yaml\n",
        )
        .unwrap();
        assert!(matches!(mechanism, DeployMechanism::StackUpdate { .. }));

        let direct: DeployMechanism = serde_yaml::from_str("mechanism: direct-update\n").unwrap();
        assert_eq!(direct, DeployMechanism::DirectUpdate);
    }
}
