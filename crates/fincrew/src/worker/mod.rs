pub mod job;
pub mod pool;
pub mod runner;

pub use job::{normalize_query, Job, JobResult, DEFAULT_QUERY};
pub use pool::WorkerPool;
pub use runner::JobRunner;
