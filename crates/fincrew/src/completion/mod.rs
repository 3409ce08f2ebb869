//! Language-model completion backends.
//!
//! The pipeline only depends on the [`CompletionClient`] trait; the concrete
//! backend is injected at construction so tests can substitute a fake.

pub mod ollama;
pub mod retry;

use std::sync::Arc;

use thiserror::Error;

pub use ollama::{OllamaClient, OllamaConfig};
pub use retry::{RetryPolicy, RetryingClient};

/// A fully rendered prompt ready to be sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Persona / instructions presented to the model ahead of the prompt.
    pub system: Option<String>,
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Errors reported by a completion backend.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion backend unavailable: {0}")]
    Unavailable(String),

    #[error("Completion timed out: {0}")]
    Timeout(String),

    #[error("Completion refused: {0}")]
    Refused(String),
}

impl CompletionError {
    /// Whether a repeated attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CompletionError::Unavailable(_) | CompletionError::Timeout(_)
        )
    }
}

/// Synchronous call to a language model. Blocking from the caller's view;
/// no retries at this layer.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

impl<C: CompletionClient + ?Sized> CompletionClient for Arc<C> {
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        (**self).complete(request)
    }
}

impl<C: CompletionClient + ?Sized> CompletionClient for Box<C> {
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        (**self).complete(request)
    }
}

/// Builds the Ollama backend, wrapped in a retry decorator only when the
/// policy allows more than one attempt.
pub fn ollama_client(
    config: OllamaConfig,
    policy: RetryPolicy,
) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    let client = OllamaClient::new(config)?;
    if policy.max_attempts > 1 {
        Ok(Arc::new(RetryingClient::new(client, policy)))
    } else {
        Ok(Arc::new(client))
    }
}
