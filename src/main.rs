// ABOUTME: Entry point for the fnpipe CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::UpdateCodeArgs;
use fnpipe::config;
use fnpipe::error::Result;
use fnpipe::executor::DefinitionWriter;
use fnpipe::output::{Output, OutputMode};
use fnpipe::resolve::Selection;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { pipeline, force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, pipeline.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Resolve { env, selection } => {
            let config = commands::load_config(config_path)?;
            let selection = Selection::from_args(selection.functions, selection.all);
            commands::resolve(&config, env, selection, output)
        }
        Commands::Synth {
            env,
            selection,
            out,
            format,
        } => {
            let config = commands::load_config(config_path)?;
            let selection = Selection::from_args(selection.functions, selection.all);
            let to_stdout = out.is_none();
            let writer = match out {
                Some(path) => DefinitionWriter::new(format).to_path(path),
                None => DefinitionWriter::new(format),
            };
            commands::synth(&config, env, selection, &writer, to_stdout, output).await
        }
        Commands::UpdateCode {
            function,
            bucket,
            key,
            region,
            metadata_host,
            check_only,
            skip_artifact_check,
        } => {
            let args = UpdateCodeArgs {
                function,
                bucket,
                key,
                region,
                metadata_host,
                check_only,
                skip_artifact_check,
            };
            commands::update_code(args, output).await
        }
    }
}
