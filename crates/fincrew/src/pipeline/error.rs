use thiserror::Error;

use crate::completion::CompletionError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid pipeline definition: {0}")]
    InvalidDefinition(String),

    #[error("Stage '{stage}' references unbound variable '{name}'")]
    MissingVariable { stage: String, name: String },

    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: CompletionError,
    },
}

impl PipelineError {
    /// Name of the stage the error is attributed to, if any.
    pub fn stage(&self) -> Option<&str> {
        match self {
            PipelineError::InvalidDefinition(_) => None,
            PipelineError::MissingVariable { stage, .. } | PipelineError::StageFailed { stage, .. } => {
                Some(stage)
            }
        }
    }
}
