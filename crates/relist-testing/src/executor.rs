use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::task::Waker;
use std::time::Duration;

use futures_task::ArcWake;
use relist_foundation::{DiffExecutor, DiffJob};

/// Executor that only runs jobs when told to.
///
/// Clones share the queue, so a test can keep one handle while the scheduler
/// owns another. Jobs may be run in any order to reproduce races between a
/// stale computation and a newer one.
#[derive(Clone, Default)]
pub struct ManualExecutor {
    queue: Arc<Mutex<VecDeque<DiffJob>>>,
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to pass to a scheduler.
    pub fn shared(&self) -> Arc<dyn DiffExecutor> {
        Arc::new(self.clone())
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Runs the oldest queued job. Returns false if the queue was empty.
    pub fn run_next(&self) -> bool {
        let job = self.lock().pop_front();
        Self::run(job)
    }

    /// Runs the newest queued job. Returns false if the queue was empty.
    pub fn run_last(&self) -> bool {
        let job = self.lock().pop_back();
        Self::run(job)
    }

    /// Runs queued jobs oldest first until the queue is empty.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Drops every queued job without running it.
    ///
    /// A dropped job counts as finished, so the scheduler may queue the job
    /// it was holding back.
    pub fn discard_all(&self) -> usize {
        let dropped: Vec<DiffJob> = self.lock().drain(..).collect();
        dropped.len()
    }

    fn run(job: Option<DiffJob>) -> bool {
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DiffJob>> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DiffExecutor for ManualExecutor {
    fn execute(&self, job: DiffJob) {
        self.lock().push_back(job);
    }
}

impl std::fmt::Debug for ManualExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualExecutor")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Waker target that lets a test thread block until a result is posted.
#[derive(Debug, Default)]
pub struct SettleSignal {
    state: Mutex<SignalState>,
    condvar: Condvar,
}

#[derive(Debug, Default)]
struct SignalState {
    notified: bool,
    wakes: u64,
}

impl SettleSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A waker that notifies this signal.
    pub fn waker(self: &Arc<Self>) -> Waker {
        futures_task::waker(Arc::clone(self))
    }

    /// Total number of wakes so far.
    pub fn wakes(&self) -> u64 {
        self.lock().wakes
    }

    /// Blocks until woken or `timeout` passes. Consumes the notification.
    /// Returns true if woken.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (mut state, _) = self
            .condvar
            .wait_timeout_while(guard, timeout, |state| !state.notified)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut state.notified)
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ArcWake for SettleSignal {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        let mut state = arc_self.lock();
        state.notified = true;
        state.wakes += 1;
        arc_self.condvar.notify_all();
    }
}
