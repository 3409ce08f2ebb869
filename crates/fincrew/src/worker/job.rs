use std::path::PathBuf;

/// Query used when the caller sends none, or only whitespace.
pub const DEFAULT_QUERY: &str = "Analyze this financial document for investment insights";

/// Trims the caller's query and falls back to `default` when it is blank.
pub fn normalize_query(query: Option<&str>, default: &str) -> String {
    match query.map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => default.to_string(),
    }
}

/// One document+query pair to run through the pipeline.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    /// Uploaded file on disk. Owned by this job and deleted when it finishes.
    pub artifact_path: PathBuf,
    /// Name the client uploaded the file as; stored with the result.
    pub filename: String,
    pub query: String,
}

impl Job {
    /// The query is normalized with [`DEFAULT_QUERY`] as the fallback.
    pub fn new(artifact_path: PathBuf, filename: impl Into<String>, query: Option<&str>) -> Self {
        Self::with_default_query(artifact_path, filename, query, DEFAULT_QUERY)
    }

    pub fn with_default_query(
        artifact_path: PathBuf,
        filename: impl Into<String>,
        query: Option<&str>,
        default_query: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            artifact_path,
            filename: filename.into(),
            query: normalize_query(query, default_query),
        }
    }
}

#[derive(Debug)]
pub struct JobResult {
    pub job_id: String,
    pub filename: String,
    pub success: bool,
    /// Id of the stored record; set only on success.
    pub record_id: Option<i64>,
    /// Stage the failure is attributed to, when a stage failed.
    pub failed_stage: Option<String>,
    pub error: Option<String>,
    /// Whether this job's cleanup removed the artifact file.
    pub artifact_removed: bool,
}

impl JobResult {
    pub fn success(job: &Job, record_id: i64, artifact_removed: bool) -> Self {
        Self {
            job_id: job.id.clone(),
            filename: job.filename.clone(),
            success: true,
            record_id: Some(record_id),
            failed_stage: None,
            error: None,
            artifact_removed,
        }
    }

    pub fn failure(
        job: &Job,
        failed_stage: Option<String>,
        error: String,
        artifact_removed: bool,
    ) -> Self {
        Self {
            job_id: job.id.clone(),
            filename: job.filename.clone(),
            success: false,
            record_id: None,
            failed_stage,
            error: Some(error),
            artifact_removed,
        }
    }
}
