//! Application state and wiring

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use tracing::{info, warn};

use fincrew::config::AppConfig;
use fincrew::sanitize::redact_url;
use fincrew::{
    ollama_client, JobResult, JobRunner, PdfTextSource, Pipeline, ResultStore,
    SqliteResultStore, WorkerPool,
};

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<WorkerPool>,
    pub store: Arc<dyn ResultStore>,
    pub data_directory: PathBuf,
    pub default_query: String,
}

/// Long-lived components, built before the async runtime starts.
///
/// The completion client is blocking, so it is created here and only ever
/// used and dropped on worker threads.
pub struct App {
    state: AppState,
    result_logger: Option<JoinHandle<()>>,
}

impl App {
    pub fn build(config: &AppConfig) -> Result<Self> {
        info!(
            "Completion backend: {} (model {})",
            redact_url(&config.completion.base_url),
            config.completion.model
        );

        let store = SqliteResultStore::open(&config.database_path).with_context(|| {
            format!("Failed to open result store {}", config.database_path.display())
        })?;
        let store: Arc<dyn ResultStore> = Arc::new(store);

        let client = ollama_client(config.completion.ollama(), config.completion.retry.policy())
            .context("Failed to create completion client")?;
        let pipeline = Pipeline::new(&config.pipeline_config(), client)
            .context("Invalid pipeline definition")?;
        info!(
            "Pipeline stages: {}",
            pipeline.stage_names().collect::<Vec<_>>().join(" -> ")
        );

        let runner = JobRunner::new(
            Arc::new(PdfTextSource::new(config.max_document_chars)),
            Arc::new(pipeline),
            Arc::clone(&store),
        );
        let pool = Arc::new(
            WorkerPool::new(Arc::new(runner), config.worker_count)
                .context("Failed to start worker pool")?,
        );

        let results = pool.results();
        let result_logger = thread::Builder::new()
            .name("fincrew-results".to_string())
            .spawn(move || {
                for result in results.iter() {
                    log_result(&result);
                }
            })
            .context("Failed to spawn result logger")?;

        std::fs::create_dir_all(&config.data_directory).with_context(|| {
            format!(
                "Failed to create data directory {}",
                config.data_directory.display()
            )
        })?;

        Ok(Self {
            state: AppState {
                pool,
                store,
                data_directory: config.data_directory.clone(),
                default_query: config.default_query.clone(),
            },
            result_logger: Some(result_logger),
        })
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Stops intake, lets queued jobs finish and joins all threads.
    /// Must be called outside the async runtime.
    pub fn shutdown(mut self) {
        self.state.pool.wait();
        if let Some(handle) = self.result_logger.take() {
            if handle.join().is_err() {
                warn!("Result logger panicked");
            }
        }
    }
}

fn log_result(result: &JobResult) {
    match (result.success, result.record_id) {
        (true, Some(id)) => info!(
            job_id = %result.job_id,
            "Analysis of '{}' stored as #{}",
            result.filename,
            id
        ),
        _ => warn!(
            job_id = %result.job_id,
            stage = result.failed_stage.as_deref().unwrap_or("-"),
            "Analysis of '{}' failed: {}",
            result.filename,
            result.error.as_deref().unwrap_or("unknown error")
        ),
    }
}
