// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use fnpipe::executor::DefinitionFormat;
use fnpipe::types::EnvName;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fnpipe")]
#[command(about = "Delivery pipeline orchestrator for serverless functions")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON event lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the config file (default: discover fnpipe.yml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which functions of an environment to act on.
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Function to deploy (repeatable)
    #[arg(short, long = "function", value_name = "NAME")]
    pub functions: Vec<String>,

    /// Deploy every function configured for the environment
    #[arg(long, conflicts_with = "functions")]
    pub all: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new fnpipe.yml configuration file
    Init {
        /// Pipeline name
        #[arg(long)]
        pipeline: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show which functions would be deployed to an environment
    Resolve {
        /// Target environment (dev, qa, stage, prod)
        env: EnvName,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Build the pipeline definition for an environment and hand it off
    Synth {
        /// Target environment (dev, qa, stage, prod)
        env: EnvName,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Write the definition to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Definition format
        #[arg(long, value_enum, default_value_t = DefinitionFormat::Json)]
        format: DefinitionFormat,
    },

    /// Exchange build credentials and point the function at the new artifact
    UpdateCode {
        /// Function to update
        #[arg(long, env = "FN_NAME")]
        function: String,

        /// Bucket holding the artifact
        #[arg(long, env = "S3_BUCKET")]
        bucket: String,

        /// Object key of the artifact
        #[arg(long, env = "S3_BUCKET_KEY")]
        key: String,

        /// Region of the function
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,

        /// Host serving the relative credentials URI
        #[arg(long, env = "FNPIPE_METADATA_HOST")]
        metadata_host: Option<String>,

        /// Validate inputs and credentials without calling the update API
        #[arg(long)]
        check_only: bool,

        /// Do not check that the artifact exists before exchanging credentials
        #[arg(long)]
        skip_artifact_check: bool,
    },
}
