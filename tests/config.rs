// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, env var interpolation, and per-environment overrides.

use fnpipe::config::*;
use fnpipe::error::Error;
use fnpipe::plan::{DeployMechanism, StageLayout};
use fnpipe::types::{BucketRef, EnvName};
use std::time::Duration;

const BASE: &str = r#"
pipeline: greeting-delivery
state: deployment-state/deployment-state.json
artifact_bucket: artifactory-bucket
source:
  owner: acme
  repo: delivery
  branch: main
  token_secret: github-token
"#;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = Config::from_yaml(BASE).unwrap();
        assert_eq!(config.pipeline, "greeting-delivery");
        assert_eq!(config.source.owner, "acme");
        assert_eq!(config.artifact_bucket, EnvValue::literal("artifactory-bucket"));
        assert!(config.environments.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
pipeline: greeting-delivery
state: state.yml
artifact_bucket:
  env: ARTIFACT_BUCKET
  default: artifactory-bucket
source:
  owner: acme
  repo: delivery
  branch:
    env: SOURCE_BRANCH
    default: main
  token_secret: github-token
layout: merged
deploy:
  mechanism: stack-update
  stack_name: greeting-stack
  template_path: build/template.yml
build:
  image: standard-5.0
  timeout: 15m
metadata_host:
  env: FNPIPE_METADATA_HOST
environments:
  prod:
    artifact_bucket: prod-artifacts
    layout: separate
    deploy:
      mechanism: invoke
      deployer: deployer-fn
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.layout, StageLayout::Merged);
        assert_eq!(
            config.deploy,
            DeployMechanism::StackUpdate {
                stack_name: "greeting-stack".to_string(),
                template_path: "build/template.yml".to_string(),
            }
        );
        assert_eq!(config.build.image, "standard-5.0");
        assert_eq!(config.build.timeout, Duration::from_secs(900));
        assert!(config.metadata_host.is_some());
        assert!(config.environments.contains_key(&EnvName::Prod));
    }

    #[test]
    fn missing_source_is_error() {
        let yaml = r#"
pipeline: greeting-delivery
state: state.json
artifact_bucket: artifactory-bucket
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn empty_token_secret_is_invalid() {
        let yaml = BASE.replace("token_secret: github-token", "token_secret: \"\"");
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(msg) if msg.contains("token_secret")));
    }

    #[test]
    fn invalid_layout_is_error() {
        let yaml = format!("{BASE}layout: sideways\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }
}

mod overrides {
    use super::*;

    fn with_prod_override() -> Config {
        let yaml = format!(
            "{BASE}environments:\n  prod:\n    artifact_bucket: prod-artifacts\n    branch: release\n    layout: merged\n"
        );
        Config::from_yaml(&yaml).unwrap()
    }

    #[test]
    fn environment_without_override_is_base() {
        let config = with_prod_override();
        let dev = config.for_environment(EnvName::Dev);
        assert_eq!(dev.artifact_bucket, EnvValue::literal("artifactory-bucket"));
        assert_eq!(dev.layout, StageLayout::Separate);
    }

    #[test]
    fn override_replaces_fields() {
        let config = with_prod_override();
        let prod = config.for_environment(EnvName::Prod);
        assert_eq!(prod.artifact_bucket, EnvValue::literal("prod-artifacts"));
        assert_eq!(prod.source.branch, EnvValue::literal("release"));
        assert_eq!(prod.layout, StageLayout::Merged);
        assert_eq!(prod.source.owner, "acme");
    }

    #[test]
    fn settings_resolve_per_environment() {
        let config = with_prod_override();

        let prod = config.settings(EnvName::Prod).unwrap();
        assert_eq!(prod.bucket, BucketRef::new("prod-artifacts"));
        assert_eq!(prod.source.branch, "release");
        assert_eq!(prod.environment, EnvName::Prod);

        let qa = config.settings(EnvName::Qa).unwrap();
        assert_eq!(qa.bucket, BucketRef::new("artifactory-bucket"));
    }
}

mod env_values {
    use super::*;

    const FROM_ENV: &str = r#"
pipeline: greeting-delivery
state: state.json
artifact_bucket:
  env: FNPIPE_IT_BUCKET
source:
  owner: acme
  repo: delivery
  branch: main
  token_secret: github-token
metadata_host:
  env: FNPIPE_IT_METADATA_HOST
"#;

    #[test]
    fn bucket_from_environment() {
        temp_env::with_vars(
            [
                ("FNPIPE_IT_BUCKET", Some("env-bucket")),
                ("FNPIPE_IT_METADATA_HOST", Some("169.254.170.2")),
            ],
            || {
                let settings = Config::from_yaml(FROM_ENV)
                    .unwrap()
                    .settings(EnvName::Dev)
                    .unwrap();
                assert_eq!(settings.bucket, BucketRef::new("env-bucket"));
                assert_eq!(
                    settings.build.metadata_host.as_deref(),
                    Some("169.254.170.2")
                );
            },
        );
    }

    #[test]
    fn unset_bucket_variable_is_error() {
        temp_env::with_vars_unset(["FNPIPE_IT_BUCKET", "FNPIPE_IT_METADATA_HOST"], || {
            let err = Config::from_yaml(FROM_ENV)
                .unwrap()
                .settings(EnvName::Dev)
                .unwrap_err();
            assert!(matches!(err, Error::MissingEnvVar(var) if var == "FNPIPE_IT_BUCKET"));
        });
    }

    #[test]
    fn unset_metadata_host_is_optional() {
        temp_env::with_vars(
            [
                ("FNPIPE_IT_BUCKET", Some("env-bucket")),
                ("FNPIPE_IT_METADATA_HOST", None),
            ],
            || {
                let settings = Config::from_yaml(FROM_ENV)
                    .unwrap()
                    .settings(EnvName::Dev)
                    .unwrap();
                assert!(settings.build.metadata_host.is_none());
            },
        );
    }
}

mod discovery {
    use super::*;

    #[test]
    fn discovers_alternate_filename() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME_ALT), BASE).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(
            config.state_path(),
            dir.path().join("deployment-state/deployment-state.json")
        );
    }

    #[test]
    fn missing_config_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::discover(dir.path()),
            Err(Error::ConfigNotFound(_))
        ));
    }

    #[test]
    fn init_force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "old").unwrap();

        assert!(matches!(
            init_config(dir.path(), None, false),
            Err(Error::AlreadyExists(_))
        ));
        init_config(dir.path(), Some("fresh"), true).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.pipeline, "fresh");
    }
}
