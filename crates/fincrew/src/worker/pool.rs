use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::{debug, error, info};

use crate::error::WorkerError;
use crate::worker::job::{Job, JobResult};
use crate::worker::runner::JobRunner;

/// Fixed-size set of worker threads fed by a bounded job queue.
///
/// `shutdown` stops intake; jobs already queued are still processed so their
/// artifacts get cleaned up. `wait` joins the workers.
pub struct WorkerPool {
    job_sender: Mutex<Option<Sender<Job>>>,
    result_receiver: Receiver<JobResult>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shutdown: AtomicBool,
    worker_count: usize,
}

impl WorkerPool {
    /// Starts `worker_count` workers (at least one) sharing `runner`.
    pub fn new(runner: Arc<JobRunner>, worker_count: usize) -> Result<Self, WorkerError> {
        let worker_count = worker_count.max(1);
        let (job_sender, job_receiver) = bounded::<Job>(worker_count * 2);
        let (result_sender, result_receiver) = unbounded::<JobResult>();

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let result_tx = result_sender.clone();
            let worker_runner = Arc::clone(&runner);

            let handle = thread::Builder::new()
                .name(format!("fincrew-worker-{}", worker_id))
                .spawn(move || run_worker(worker_id, job_rx, result_tx, worker_runner))
                .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Ok(Self {
            job_sender: Mutex::new(Some(job_sender)),
            result_receiver,
            workers: Mutex::new(workers),
            shutdown: AtomicBool::new(false),
            worker_count,
        })
    }

    /// Queues a job, blocking while the queue is full.
    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(WorkerError::ChannelClosed);
        }

        let sender = self
            .job_sender
            .lock()
            .map_err(|_| WorkerError::ChannelClosed)?
            .clone()
            .ok_or(WorkerError::ChannelClosed)?;

        sender.send(job).map_err(|_| WorkerError::ChannelClosed)
    }

    pub fn try_recv_result(&self) -> Option<JobResult> {
        self.result_receiver.try_recv().ok()
    }

    /// Blocks for the next result. `None` once every worker has exited and
    /// all results were taken.
    pub fn recv_result(&self) -> Option<JobResult> {
        self.result_receiver.recv().ok()
    }

    /// A second handle on the result stream, for a dedicated consumer thread.
    pub fn results(&self) -> Receiver<JobResult> {
        self.result_receiver.clone()
    }

    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Shutting down worker pool...");
        // Workers drain what is queued, then see the disconnect.
        if let Ok(mut sender) = self.job_sender.lock() {
            sender.take();
        }
    }

    /// Shuts down (if not already) and joins every worker.
    pub fn wait(&self) {
        self.shutdown();

        let workers = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(_) => {
                error!("Worker handle list poisoned; not joining");
                return;
            }
        };

        for (i, worker) in workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.wait();
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<Job>,
    result_sender: Sender<JobResult>,
    runner: Arc<JobRunner>,
) {
    debug!("Worker {} started", worker_id);

    // Returns Err only once the queue is empty and every sender is gone.
    while let Ok(job) = job_receiver.recv() {
        debug!("Worker {} processing job {}", worker_id, job.id);

        let fallback = job.clone();
        let result = match panic::catch_unwind(AssertUnwindSafe(|| runner.process(job))) {
            Ok(result) => result,
            Err(_) => {
                error!("Worker {} panicked while processing job {}", worker_id, fallback.id);
                // The runner's artifact guard already ran during unwinding.
                let removed = !fallback.artifact_path.exists();
                JobResult::failure(&fallback, None, "job panicked".to_string(), removed)
            }
        };

        if result_sender.send(result).is_err() {
            debug!("Worker {} result receiver dropped", worker_id);
        }
    }

    debug!("Worker {} stopped", worker_id);
}
