use std::collections::HashMap;

use serde::Serialize;

/// Output of one stage. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub stage: String,
    pub text: String,
    /// Zero-based position in declared stage order.
    pub position: usize,
}

/// The ordered stage results of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRun {
    results: Vec<StageResult>,
}

impl PipelineRun {
    pub fn results(&self) -> &[StageResult] {
        &self.results
    }

    /// Text of the last stage, the canonical result of the run.
    pub fn output(&self) -> &str {
        self.results.last().map(|r| r.text.as_str()).unwrap_or("")
    }

    pub fn into_output(self) -> String {
        self.results.into_iter().last().map(|r| r.text).unwrap_or_default()
    }
}

/// Mutable state threaded through one run: the global variables and the
/// results produced so far.
pub struct PipelineContext<'g> {
    pub globals: &'g HashMap<String, String>,
    results: Vec<StageResult>,
}

impl<'g> PipelineContext<'g> {
    pub fn new(globals: &'g HashMap<String, String>) -> Self {
        Self {
            globals,
            results: Vec::new(),
        }
    }

    pub fn result_at(&self, position: usize) -> Option<&StageResult> {
        self.results.get(position)
    }

    pub fn record(&mut self, stage: &str, text: String) -> &StageResult {
        let position = self.results.len();
        self.results.push(StageResult {
            stage: stage.to_string(),
            text,
            position,
        });
        &self.results[position]
    }

    pub fn finish(self) -> PipelineRun {
        PipelineRun {
            results: self.results,
        }
    }
}
