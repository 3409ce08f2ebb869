use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use tracing::{debug, info_span};

use crate::completion::{CompletionClient, CompletionRequest};

use super::config::{CompiledStage, PipelineConfig};
use super::context::{PipelineContext, PipelineRun};
use super::error::PipelineError;
use super::progress::{NoopProgress, ProgressEvent, ProgressReporter};

/// Header placed between a stage's own prompt and its dependency blocks.
pub const CONTEXT_HEADER: &str = "This is the context you're working with:";

/// An ordered, validated chain of stages bound to one completion backend.
pub struct Pipeline {
    stages: Vec<CompiledStage>,
    client: Arc<dyn CompletionClient>,
}

impl Pipeline {
    /// Validates the definition once; a pipeline that constructs never fails
    /// with `InvalidDefinition` at run time.
    pub fn new(
        config: &PipelineConfig,
        client: Arc<dyn CompletionClient>,
    ) -> Result<Self, PipelineError> {
        let stages = config.compile()?;
        Ok(Self { stages, client })
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.stage.name.as_str())
    }

    pub fn run(&self, globals: &HashMap<String, String>) -> Result<PipelineRun, PipelineError> {
        self.run_with_progress(globals, &NoopProgress)
    }

    /// Executes every stage in declared order. The first failing stage aborts
    /// the run; later stages are never called.
    pub fn run_with_progress(
        &self,
        globals: &HashMap<String, String>,
        progress: &dyn ProgressReporter,
    ) -> Result<PipelineRun, PipelineError> {
        let total = self.stages.len();
        let _pipeline_span = info_span!("pipeline", stages = total).entered();
        let mut ctx = PipelineContext::new(globals);

        for (position, compiled) in self.stages.iter().enumerate() {
            let name = compiled.stage.name.as_str();
            let _stage_span = info_span!("stage", stage = name, position).entered();

            progress.report(ProgressEvent::StageStarted {
                stage: name.to_string(),
                position,
                total,
            });

            let request = match build_request(compiled, &ctx) {
                Ok(request) => request,
                Err(e) => {
                    progress.report(ProgressEvent::Failed {
                        stage: name.to_string(),
                        error: e.to_string(),
                    });
                    return Err(e);
                }
            };

            debug!(
                "Stage '{}' prompt rendered ({} chars)",
                name,
                request.prompt.chars().count()
            );

            let text = match self.client.complete(&request) {
                Ok(text) => text,
                Err(source) => {
                    let err = PipelineError::StageFailed {
                        stage: name.to_string(),
                        source,
                    };
                    progress.report(ProgressEvent::Failed {
                        stage: name.to_string(),
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            };

            let result = ctx.record(name, text);
            progress.report(ProgressEvent::StageCompleted {
                stage: name.to_string(),
                position,
                total,
                output_chars: result.text.chars().count(),
            });
        }

        Ok(ctx.finish())
    }
}

/// Renders the prompt for one stage.
///
/// Placeholders bind to the global variables or, by stage name, to the
/// verbatim output of a declared dependency. Each dependency's output is also
/// appended as a `"<name> Output:\n<text>"` block, in declared order.
fn build_request(
    compiled: &CompiledStage,
    ctx: &PipelineContext<'_>,
) -> Result<CompletionRequest, PipelineError> {
    let stage = &compiled.stage;
    let dependency_outputs: Vec<(&str, &str)> = compiled
        .dependencies
        .iter()
        .filter_map(|&i| ctx.result_at(i))
        .map(|r| (r.stage.as_str(), r.text.as_str()))
        .collect();

    let lookup = |name: &str| {
        ctx.globals.get(name).map(String::as_str).or_else(|| {
            dependency_outputs
                .iter()
                .find(|(dep, _)| *dep == name)
                .map(|(_, text)| *text)
        })
    };

    let missing = |name: String| PipelineError::MissingVariable {
        stage: stage.name.clone(),
        name,
    };

    let mut prompt = compiled.template.render(lookup).map_err(missing)?;

    if let Some(expected) = stage.expected_output.as_deref() {
        let _ = write!(
            prompt,
            "\n\nThis is the expected criteria for your final answer:\n{}",
            expected
        );
    }

    if !dependency_outputs.is_empty() {
        let _ = write!(prompt, "\n\n{}", CONTEXT_HEADER);
        for (dep, text) in &dependency_outputs {
            let _ = write!(prompt, "\n\n{} Output:\n{}", dep, text);
        }
    }

    let mut request = CompletionRequest::new(prompt);

    let goal = compiled
        .goal
        .render(|name| ctx.globals.get(name).map(String::as_str))
        .map_err(missing)?;
    if let Some(system) = persona(&stage.role, &goal, &stage.backstory) {
        request = request.with_system(system);
    }

    Ok(request)
}

fn persona(role: &str, goal: &str, backstory: &str) -> Option<String> {
    let mut parts = Vec::new();
    if !role.trim().is_empty() {
        parts.push(format!("You are {}.", role.trim()));
    }
    if !backstory.trim().is_empty() {
        parts.push(backstory.trim().to_string());
    }
    if !goal.trim().is_empty() {
        parts.push(format!("Your personal goal is: {}", goal.trim()));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
