//! Deferred execution of artifact disposal off the test's critical path.
//!
//! `IdleQueue` owns a single tokio worker that runs submitted actions one at a
//! time, in submission order. Callers never await an action; they only learn
//! about failures afterwards through [`IdleQueue::take_errors`].
//!
//! ```no_run
//! use artifact_lifecycle::scheduling::{IdleQueue, IdleScheduler};
//!
//! # async fn run() {
//! let queue = IdleQueue::spawn();
//! queue
//!     .request_idle_callback("discard log".into(), Box::pin(async { Ok(()) }))
//!     .unwrap();
//! queue.wait_idle().await;
//! assert!(queue.take_errors().is_empty());
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, error, trace};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error_handling::types::{ArtifactError, SchedulerError};

/// A zero-argument deferred unit of work.
pub type DeferredAction = Pin<Box<dyn Future<Output = Result<(), ArtifactError>> + Send + 'static>>;

/// Host primitive that runs work "when idle", outside the critical path.
///
/// Every accepted action runs exactly once while the host keeps running. No
/// ordering between two actions is promised to callers.
pub trait IdleScheduler: Send + Sync {
    fn request_idle_callback(&self, label: String, action: DeferredAction) -> Result<(), SchedulerError>;
}

/// A deferred action that finished with an error (or panicked).
#[derive(Debug)]
pub struct DisposalFailure {
    pub label: String,
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

enum Job {
    Run { label: String, action: DeferredAction },
    Flush(oneshot::Sender<()>),
}

/// Tokio-backed [`IdleScheduler`] with an out-of-band error channel.
pub struct IdleQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    failures: Arc<Mutex<Vec<DisposalFailure>>>,
    completed: Arc<AtomicUsize>,
}

impl IdleQueue {
    /// Starts the worker task. Must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let failures = Arc::new(Mutex::new(Vec::new()));
        let completed = Arc::new(AtomicUsize::new(0));

        let worker = tokio::spawn(Self::run_worker(
            receiver,
            Arc::clone(&failures),
            Arc::clone(&completed),
        ));
        debug!("IdleQueue worker started");

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            failures,
            completed,
        }
    }

    async fn run_worker(
        mut receiver: mpsc::UnboundedReceiver<Job>,
        failures: Arc<Mutex<Vec<DisposalFailure>>>,
        completed: Arc<AtomicUsize>,
    ) {
        while let Some(job) = receiver.recv().await {
            match job {
                Job::Run { label, action } => {
                    trace!("idle action '{}' starting", label);
                    // Run on its own task so a panicking action cannot take the worker down.
                    let outcome = tokio::spawn(action).await;
                    let failure: Option<Box<dyn std::error::Error + Send + Sync>> = match outcome {
                        Ok(Ok(())) => None,
                        Ok(Err(e)) => Some(Box::new(e)),
                        Err(join_err) => Some(Box::new(SchedulerError::WorkerFailed(join_err.to_string()))),
                    };
                    if let Some(error) = failure {
                        error!("Deferred action '{}' failed: {}", label, error);
                        lock(&failures).push(DisposalFailure { label, error });
                    } else {
                        trace!("idle action '{}' done", label);
                    }
                    completed.fetch_add(1, Ordering::SeqCst);
                }
                Job::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("IdleQueue worker stopped");
    }

    fn send(&self, job: Job) -> Result<(), SchedulerError> {
        lock(&self.sender)
            .as_ref()
            .ok_or(SchedulerError::QueueClosed)?
            .send(job)
            .map_err(|_| SchedulerError::QueueClosed)
    }

    /// Resolves once every action submitted before this call has finished.
    /// Returns immediately on a closed queue.
    pub async fn wait_idle(&self) {
        let (done, wait) = oneshot::channel();
        if self.send(Job::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// Drains and returns the failures reported so far.
    pub fn take_errors(&self) -> Vec<DisposalFailure> {
        std::mem::take(&mut *lock(&self.failures))
    }

    /// Number of actions that ran to completion, successfully or not.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Stops accepting work, lets already queued actions finish, then joins the worker.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        drop(lock(&self.sender).take());
        let worker = lock(&self.worker).take();
        if let Some(worker) = worker {
            worker
                .await
                .map_err(|e| SchedulerError::WorkerFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl IdleScheduler for IdleQueue {
    fn request_idle_callback(&self, label: String, action: DeferredAction) -> Result<(), SchedulerError> {
        trace!("idle action '{}' queued", label);
        self.send(Job::Run { label, action })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
