use log::{info, warn};

/// Events emitted by the pipeline while a job runs.
/// Stage outputs are omitted (they can be large).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    StageStarted {
        stage: String,
        position: usize,
        total: usize,
    },
    StageCompleted {
        stage: String,
        position: usize,
        total: usize,
        output_chars: usize,
    },
    Failed {
        stage: String,
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes progress to the log, tagged with the job id.
pub struct LogProgress {
    job_id: String,
}

impl LogProgress {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::StageStarted {
                stage,
                position,
                total,
            } => {
                info!("[{}] stage {}/{} '{}' started", self.job_id, position + 1, total, stage);
            }
            ProgressEvent::StageCompleted {
                stage,
                position,
                total,
                output_chars,
            } => {
                info!(
                    "[{}] stage {}/{} '{}' completed ({} chars)",
                    self.job_id,
                    position + 1,
                    total,
                    stage,
                    output_chars
                );
            }
            ProgressEvent::Failed { stage, error } => {
                warn!("[{}] stage '{}' failed: {}", self.job_id, stage, error);
            }
        }
    }
}
