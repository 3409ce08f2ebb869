use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::completion::{OllamaConfig, RetryPolicy};
use crate::pipeline::{financial_pipeline, PipelineConfig, Stage};
use crate::processor::DEFAULT_MAX_CHARS;
use crate::worker::DEFAULT_QUERY;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: String,
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,
    #[serde(default = "default_query")]
    pub default_query: String,
    #[serde(default)]
    pub completion: CompletionConfig,
    /// Replaces the built-in financial pipeline when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<Stage>>,
}

fn default_data_directory() -> PathBuf {
    PathBuf::from("data")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("analysis.db")
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_max_document_chars() -> usize {
    DEFAULT_MAX_CHARS
}

fn default_query() -> String {
    DEFAULT_QUERY.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            data_directory: default_data_directory(),
            database_path: default_database_path(),
            worker_count: default_worker_count(),
            max_document_chars: default_max_document_chars(),
            default_query: default_query(),
            completion: CompletionConfig::default(),
            stages: None,
        }
    }
}

impl AppConfig {
    /// The configured stages, or the built-in four-stage analysis.
    pub fn pipeline_config(&self) -> PipelineConfig {
        match &self.stages {
            Some(stages) => PipelineConfig::new(stages.clone()),
            None => financial_pipeline(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            retry: RetryConfig::default(),
        }
    }
}

impl CompletionConfig {
    pub fn ollama(&self) -> OllamaConfig {
        OllamaConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Retry is off unless `max_attempts` > 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> usize {
    1
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts).with_backoff(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
        )
    }
}
