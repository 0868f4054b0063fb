//! Where diff computations run.
//!
//! The scheduler never computes a diff itself; it hands a [`DiffJob`] to a
//! [`DiffExecutor`]. Results always travel back through the scheduler's
//! channel, so the executor choice never changes *where* results are applied.

use std::sync::mpsc::{channel, Sender};
use std::sync::Mutex;
use std::thread;

use futures_task::{FutureObj, Spawn};

use crate::config::ReconcilerConfig;

/// A unit of background work: compute one diff and post its result.
pub type DiffJob = Box<dyn FnOnce() + Send + 'static>;

/// Runs diff jobs off the consumer's thread.
pub trait DiffExecutor: Send + Sync {
    fn execute(&self, job: DiffJob);
}

/// Single dedicated background thread fed through a channel.
///
/// Jobs run strictly one after another, so at most one diff is computing at
/// any time. Superseded jobs still queued exit at their first token check.
/// Dropping the executor closes the channel and lets the thread finish.
pub struct WorkerExecutor {
    jobs: Mutex<Sender<DiffJob>>,
}

impl WorkerExecutor {
    pub fn new(thread_name: impl Into<String>) -> std::io::Result<Self> {
        let (tx, rx) = channel::<DiffJob>();
        let name = thread_name.into();
        thread::Builder::new().name(name.clone()).spawn(move || {
            log::trace!("{name} started");
            while let Ok(job) = rx.recv() {
                job();
            }
            log::trace!("{name} stopped");
        })?;
        Ok(Self {
            jobs: Mutex::new(tx),
        })
    }

    /// Spawns the worker thread named after `config`.
    pub fn from_config(config: &ReconcilerConfig) -> std::io::Result<Self> {
        Self::new(config.worker_thread_name.clone())
    }
}

impl DiffExecutor for WorkerExecutor {
    fn execute(&self, job: DiffJob) {
        let jobs = self
            .jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if jobs.send(job).is_err() {
            log::warn!("diff worker is gone; dropping job");
        }
    }
}

impl std::fmt::Debug for WorkerExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerExecutor").finish_non_exhaustive()
    }
}

/// Runs each job immediately on the submitting thread.
///
/// The result is still only applied on the next
/// [`drain`](crate::UpdateScheduler::drain).
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl DiffExecutor for InlineExecutor {
    fn execute(&self, job: DiffJob) {
        job();
    }
}

/// Adapts any [`Spawn`] implementation (a futures thread pool, a local
/// executor handle) into a [`DiffExecutor`].
#[derive(Debug)]
pub struct SpawnExecutor<S> {
    spawner: S,
}

impl<S: Spawn> SpawnExecutor<S> {
    pub fn new(spawner: S) -> Self {
        Self { spawner }
    }
}

impl<S: Spawn + Send + Sync> DiffExecutor for SpawnExecutor<S> {
    fn execute(&self, job: DiffJob) {
        let future = FutureObj::new(Box::new(async move { job() }));
        if let Err(err) = self.spawner.spawn_obj(future) {
            log::warn!("failed to spawn diff job: {err}");
        }
    }
}
