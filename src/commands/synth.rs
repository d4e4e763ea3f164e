// ABOUTME: Synth command implementation.
// ABOUTME: Resolves functions, builds and sequences their plans, and hands the definition off.

use fnpipe::config::Config;
use fnpipe::diagnostics::Diagnostics;
use fnpipe::error::Result;
use fnpipe::executor::{PipelineDefinition, PipelineExecutor, PipelineSpec};
use fnpipe::output::Output;
use fnpipe::plan::sequence;
use fnpipe::resolve::{Selection, resolve};
use fnpipe::state::DeploymentState;
use fnpipe::types::{EnvName, FunctionRef};

pub async fn synth<E: PipelineExecutor + ?Sized>(
    config: &Config,
    env: EnvName,
    selection: Selection,
    executor: &E,
    to_stdout: bool,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();

    let settings = config.settings(env)?;
    let state = DeploymentState::load(&settings.state_path)?;
    let functions = resolve(&state, env, &selection, &mut diag)?;
    let builder = settings.plan_builder();

    let mut pipelines = Vec::with_capacity(functions.len());
    for function in functions.iter() {
        let target = FunctionRef::new(&function.name);
        let plan = builder.build(function, &settings.bucket, &target)?;
        let groups = sequence(&plan, settings.layout)?;
        tracing::debug!(
            function = %target,
            groups = groups.len(),
            layout = ?settings.layout,
            "planned pipeline"
        );

        pipelines.push(PipelineSpec {
            function: target,
            entry: function.entry.clone(),
            bucket: settings.bucket.clone(),
            groups,
        });
    }

    let definition = PipelineDefinition {
        pipeline: settings.pipeline.clone(),
        environment: env,
        pipelines,
    };
    let submission = executor.submit(&definition).await?;

    output.warnings(&diag);
    // On stdout the definition itself is the result.
    if !to_stdout {
        output.success(&format!(
            "Handed off {} pipeline(s) for {} to {}",
            submission.pipelines, env, submission.destination
        ));
    }
    Ok(())
}
