// ABOUTME: Resolve command implementation.
// ABOUTME: Prints the functions a synth for the same arguments would deploy.

use fnpipe::config::Config;
use fnpipe::diagnostics::Diagnostics;
use fnpipe::error::Result;
use fnpipe::output::{Output, OutputMode};
use fnpipe::resolve::{Selection, resolve as resolve_functions};
use fnpipe::types::EnvName;

use super::load_state;

pub fn resolve(config: &Config, env: EnvName, selection: Selection, output: Output) -> Result<()> {
    let mut diag = Diagnostics::default();
    let state = load_state(config, env)?;
    let functions = resolve_functions(&state, env, &selection, &mut diag)?;

    match output.mode() {
        OutputMode::Json => {
            if let Ok(json) = serde_json::to_string(&functions.iter().collect::<Vec<_>>()) {
                println!("{json}");
            }
        }
        OutputMode::Normal | OutputMode::Quiet => {
            for function in functions.iter() {
                println!("{}\t{}\t{}", function.name, function.artifact, function.entry);
            }
        }
    }

    output.warnings(&diag);
    Ok(())
}
