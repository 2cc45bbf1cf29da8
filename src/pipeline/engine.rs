//! Sequential execution of a validated pipeline.

use tracing::{debug, error};

use crate::backend::DocumentBackend;
use crate::error::{Error, Result};
use crate::pipeline::context::RunContext;
use crate::pipeline::registry::{BoundStage, StageRegistry};
use crate::pipeline::stream::Stream;
use crate::pipeline::{parser, validator};

/// Walks the stage list in order, threading the stream through each stage.
///
/// State preconditions are checked before a stage body runs, so a mismatch
/// produces no partial side effects for that stage. Whatever happens, the
/// run context's scoped resources are torn down before control returns to
/// the caller; side effects of already-completed stages are not rolled back.
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(
        &self,
        stages: Vec<BoundStage>,
        backend: &dyn DocumentBackend,
        ctx: &mut RunContext,
    ) -> Result<Stream> {
        validator::validate(&stages)?;

        ctx.total_steps = stages.len();
        let result = self.run(stages, backend, ctx).await;

        if let Err(e) = &result {
            error!(step = ctx.current_step, total = ctx.total_steps, "pipeline failed: {e}");
        }
        ctx.cleanup();
        result
    }

    async fn run(
        &self,
        stages: Vec<BoundStage>,
        backend: &dyn DocumentBackend,
        ctx: &mut RunContext,
    ) -> Result<Stream> {
        let mut current: Option<Stream> = None;

        for stage in stages {
            ctx.enter_stage(stage.index, &stage.name);

            let state = current.as_ref().map(Stream::state);
            if !stage.accepts.admits(state) {
                return Err(Error::State {
                    step: ctx.current_step,
                    stage: stage.name,
                    expected: stage.accepts.to_string(),
                    actual: state.map_or_else(|| "none".to_string(), |s| s.to_string()),
                });
            }

            if ctx.config.debug {
                debug!(
                    step = ctx.current_step,
                    total = ctx.total_steps,
                    stage = %stage.name,
                    "executing stage"
                );
            }

            let output = stage.exec.execute(current.take(), ctx, backend).await?;

            if ctx.config.debug {
                debug!(
                    step = ctx.current_step,
                    stage = %stage.name,
                    stream = %output.describe(),
                    "stage complete"
                );
            }
            current = Some(output);
        }

        // Unreachable after validation: a validated pipeline has at least
        // one stage and therefore a final stream.
        current.ok_or_else(|| Error::Structure("pipeline has no stages".to_string()))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses, resolves, validates, and executes a pipeline in one call.
pub async fn run_pipeline(
    text: &str,
    registry: &StageRegistry,
    backend: &dyn DocumentBackend,
    ctx: &mut RunContext,
) -> Result<Stream> {
    let stages = parser::parse(text)?;
    let bound = registry.resolve_all(&stages)?;
    Engine::new().execute(bound, backend, ctx).await
}
