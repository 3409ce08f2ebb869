pub mod completion;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod storage;
pub mod worker;

pub use completion::{
    ollama_client, CompletionClient, CompletionError, CompletionRequest, OllamaClient,
    OllamaConfig, RetryPolicy, RetryingClient,
};
pub use config::{load_config, AppConfig};
pub use error::{
    ConfigError, ExtractError, FincrewError, Result, StorageError, WorkerError,
};
pub use pipeline::{
    financial_pipeline, Pipeline, PipelineConfig, PipelineError, PipelineRun, Stage,
};
pub use processor::{PdfTextSource, TextSource};
pub use storage::{write_upload, AnalysisRecord, ArtifactGuard, ResultStore, SqliteResultStore};
pub use worker::{Job, JobResult, JobRunner, WorkerPool};
