use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use tracing::info_span;

use crate::error::FincrewError;
use crate::pipeline::{LogProgress, Pipeline, DOCUMENT_TEXT_VAR, QUERY_VAR};
use crate::processor::TextSource;
use crate::sanitize::{preview, redact_path};
use crate::storage::{ArtifactGuard, ResultStore};
use crate::worker::job::{Job, JobResult};

/// Drives one job: extract, run the pipeline, persist, clean up.
///
/// Every collaborator is injected, so a runner can be assembled from fakes.
pub struct JobRunner {
    text_source: Arc<dyn TextSource>,
    pipeline: Arc<Pipeline>,
    store: Arc<dyn ResultStore>,
}

impl JobRunner {
    pub fn new(
        text_source: Arc<dyn TextSource>,
        pipeline: Arc<Pipeline>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            text_source,
            pipeline,
            store,
        }
    }

    /// Never fails; the outcome is reported in the returned `JobResult`.
    ///
    /// The artifact is deleted before this returns on every path, and by the
    /// guard's `Drop` if a stage panics.
    pub fn process(&self, job: Job) -> JobResult {
        let _span = info_span!(
            "job",
            job_id = %job.id,
            artifact = %redact_path(&job.artifact_path)
        )
        .entered();

        info!(
            "Job {} started for '{}' (query: \"{}\")",
            job.id,
            job.filename,
            preview(&job.query, 80)
        );

        let mut artifact = ArtifactGuard::new(&job.artifact_path);
        let outcome = self.analyze(&job);
        let artifact_removed = artifact.release();

        match outcome {
            Ok(record_id) => {
                info!("Job {} stored as analysis #{}", job.id, record_id);
                JobResult::success(&job, record_id, artifact_removed)
            }
            Err(e) => {
                let failed_stage = match &e {
                    FincrewError::Pipeline(pe) => pe.stage().map(str::to_string),
                    _ => None,
                };
                warn!("Job {} failed, no analysis stored: {}", job.id, e);
                JobResult::failure(&job, failed_stage, e.to_string(), artifact_removed)
            }
        }
    }

    fn analyze(&self, job: &Job) -> Result<i64, FincrewError> {
        let document_text = self.text_source.extract(&job.artifact_path)?;

        let globals = HashMap::from([
            (QUERY_VAR.to_string(), job.query.clone()),
            (DOCUMENT_TEXT_VAR.to_string(), document_text),
        ]);

        let progress = LogProgress::new(&job.id);
        let run = self.pipeline.run_with_progress(&globals, &progress)?;

        Ok(self.store.save(&job.filename, &job.query, run.output())?)
    }
}
