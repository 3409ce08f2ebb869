pub mod config;
pub mod context;
pub mod error;
pub mod financial;
pub mod progress;
pub mod runner;
pub mod template;

pub use config::{PipelineConfig, Stage, DOCUMENT_TEXT_VAR, QUERY_VAR};
pub use context::{PipelineContext, PipelineRun, StageResult};
pub use error::PipelineError;
pub use financial::financial_pipeline;
pub use progress::{LogProgress, NoopProgress, ProgressEvent, ProgressReporter};
pub use runner::{Pipeline, CONTEXT_HEADER};
