// ABOUTME: Command module aggregator for the fnpipe CLI.
// ABOUTME: Re-exports resolve, synth, and update-code command handlers.

mod resolve;
mod synth;
mod update_code;

pub use resolve::resolve;
pub use synth::synth;
pub use update_code::{UpdateCodeArgs, update_code};

use fnpipe::config::Config;
use fnpipe::error::Result;
use fnpipe::state::DeploymentState;
use fnpipe::types::EnvName;
use std::path::Path;

/// Load the config from `path`, or discover it in the current directory.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::discover(&std::env::current_dir()?),
    }
}

/// Load the deployment state document the config points at for `env`.
fn load_state(config: &Config, env: EnvName) -> Result<DeploymentState> {
    let path = config.for_environment(env).state_path();
    tracing::debug!(path = %path.display(), env = %env, "loading deployment state");
    Ok(DeploymentState::load(&path)?)
}
