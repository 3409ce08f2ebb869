//! Isolated environment for running jobs end to end.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use fincrew::completion::CompletionClient;
use fincrew::pipeline::{financial_pipeline, Pipeline, PipelineConfig};
use fincrew::processor::{PdfTextSource, DEFAULT_MAX_CHARS};
use fincrew::storage::{write_upload, ResultStore, SqliteResultStore};
use fincrew::worker::{Job, JobResult, JobRunner};

pub struct TestHarness {
    temp_dir: TempDir,
    pub data_dir: PathBuf,
    pub store: SqliteResultStore,
    max_chars: usize,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_MAX_CHARS)
    }

    pub fn with_budget(max_chars: usize) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let data_dir = temp_dir.path().join("data");
        let store = SqliteResultStore::open(&temp_dir.path().join("analysis.db"))
            .expect("result store opens");

        Self {
            temp_dir,
            data_dir,
            store,
            max_chars,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `bytes` the way the HTTP layer does and returns the artifact path.
    pub fn upload(&self, bytes: &[u8]) -> PathBuf {
        write_upload(&self.data_dir, bytes).expect("upload written")
    }

    pub fn runner_with(
        &self,
        config: &PipelineConfig,
        client: Arc<dyn CompletionClient>,
    ) -> JobRunner {
        let pipeline = Pipeline::new(config, client).expect("pipeline is valid");
        JobRunner::new(
            Arc::new(PdfTextSource::new(self.max_chars)),
            Arc::new(pipeline),
            Arc::new(self.store.clone()),
        )
    }

    /// Runner over the built-in financial pipeline.
    pub fn runner(&self, client: Arc<dyn CompletionClient>) -> JobRunner {
        self.runner_with(&financial_pipeline(), client)
    }

    pub fn run(&self, runner: &JobRunner, bytes: &[u8], filename: &str, query: Option<&str>) -> JobResult {
        let path = self.upload(bytes);
        runner.process(Job::new(path, filename, query))
    }

    /// Number of files left in the upload directory.
    pub fn leftover_uploads(&self) -> usize {
        std::fs::read_dir(&self.data_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub fn records(&self) -> Vec<fincrew::AnalysisRecord> {
        self.store.list_all().expect("records listed")
    }
}
