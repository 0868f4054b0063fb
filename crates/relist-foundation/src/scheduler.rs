//! Latest-wins scheduling of diff computations.
//!
//! [`UpdateScheduler`] owns the displayed source and at most one pending
//! request. Each [`submit`](UpdateScheduler::submit) cancels the previous
//! request, hands a new diff job to a [`DiffExecutor`] and returns at once.
//! At most one job runs at a time: while a cancelled job is still winding
//! down, the newest job waits in the scheduler and older waiting jobs are
//! dropped unstarted.
//! Finished jobs post their result over a channel; the consumer thread picks
//! results up with [`drain`](UpdateScheduler::drain), which applies only the
//! result of the most recent request and silently drops everything else.
//!
//! ```text
//! submit(new) ──► executor ──► compute_cancellable(displayed, new)
//!                                   │ (token checked before send)
//!                                   ▼
//!                  channel ──► drain(consumer): generation + token check
//!                                   │
//!                                   ▼
//!                 save position → displayed = new → on_update_ready → restore
//! ```

use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::task::Waker;
use std::time::Duration;

use relist_core::{
    compute_cancellable, CancellationToken, DiffOptions, EditScript, ItemDiffer, ItemSource,
    ListUpdateCallback, ReconcileError, SourceDiffCallback,
};
use web_time::Instant;

use crate::config::ReconcilerConfig;
use crate::executor::{DiffExecutor, DiffJob};
use crate::list_state::{KeyIndex, PositionSnapshot};

/// Identifies one submitted request. Later submissions compare greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn generation(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a diff is in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Computing { request: RequestId },
}

/// The single-threaded side that displays the list.
///
/// Positional callbacks come from [`ListUpdateCallback`]. The position hooks
/// default to doing nothing, for consumers without a scroll position.
pub trait ListConsumer: ListUpdateCallback {
    /// Applies a finished script. The default replays it with bounds checks.
    fn on_update_ready(&mut self, script: &EditScript) -> Result<(), ReconcileError> {
        script.dispatch_to(self)
    }

    /// Captures the scroll position before a script is applied.
    fn save_position(&mut self) -> Option<PositionSnapshot> {
        None
    }

    /// Restores a position captured by [`save_position`](Self::save_position).
    /// `keys` maps stable ids to positions in the new list; it is empty when
    /// the snapshot carries no key.
    fn restore_position(&mut self, snapshot: &PositionSnapshot, keys: &KeyIndex) {
        let _ = (snapshot, keys);
    }
}

struct PendingRequest<S> {
    id: RequestId,
    source: Option<Arc<S>>,
    token: CancellationToken,
}

struct DiffOutcome {
    request: RequestId,
    result: Result<EditScript, ReconcileError>,
}

type SharedWaker = Arc<Mutex<Option<Waker>>>;

/// Hands jobs to the executor one at a time.
///
/// While a job runs, only the newest submitted job is kept back; it starts
/// when the running one finishes or is dropped by the executor.
struct DispatchGate {
    executor: Arc<dyn DiffExecutor>,
    state: Mutex<GateState>,
}

#[derive(Default)]
struct GateState {
    running: bool,
    waiting: Option<(RequestId, DiffJob)>,
}

impl DispatchGate {
    fn new(executor: Arc<dyn DiffExecutor>) -> Arc<Self> {
        Arc::new(Self {
            executor,
            state: Mutex::new(GateState::default()),
        })
    }

    fn dispatch(self: &Arc<Self>, request: RequestId, job: DiffJob) {
        {
            let mut state = self.lock();
            if state.running {
                if let Some((replaced, _)) = state.waiting.replace((request, job)) {
                    log::trace!("request {replaced} replaced before it started");
                }
                return;
            }
            state.running = true;
        }
        self.start(job);
    }

    fn start(self: &Arc<Self>, job: DiffJob) {
        let slot = RunningSlot {
            gate: Arc::clone(self),
        };
        self.executor.execute(Box::new(move || {
            job();
            drop(slot);
        }));
    }

    fn finish(self: &Arc<Self>) {
        let next = {
            let mut state = self.lock();
            let next = state.waiting.take();
            state.running = next.is_some();
            next
        };
        if let Some((request, job)) = next {
            log::trace!("starting held request {request}");
            self.start(job);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GateState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases the gate when a job completes, panics, or is dropped unrun.
struct RunningSlot {
    gate: Arc<DispatchGate>,
}

impl Drop for RunningSlot {
    fn drop(&mut self) {
        self.gate.finish();
    }
}

/// Schedules diffs off the consumer thread and applies the newest result.
///
/// The scheduler is driven from one thread: `submit`, `drain` and the
/// accessors all take `&self`/`&mut self` on the consumer side. Only the
/// diff job itself runs elsewhere, against immutable `Arc` snapshots.
pub struct UpdateScheduler<S, D: ?Sized> {
    options: DiffOptions,
    differ: Arc<D>,
    gate: Arc<DispatchGate>,
    displayed: Option<Arc<S>>,
    pending: Option<PendingRequest<S>>,
    generation: u64,
    results_tx: Sender<DiffOutcome>,
    results_rx: Receiver<DiffOutcome>,
    waker: SharedWaker,
}

impl<S, D> UpdateScheduler<S, D>
where
    S: ItemSource + Send + Sync + 'static,
    D: ItemDiffer<S::Item> + Send + Sync + ?Sized + 'static,
{
    pub fn new(config: &ReconcilerConfig, differ: Arc<D>, executor: Arc<dyn DiffExecutor>) -> Self {
        let (results_tx, results_rx) = channel();
        Self {
            options: config.diff_options(),
            differ,
            gate: DispatchGate::new(executor),
            displayed: None,
            pending: None,
            generation: 0,
            results_tx,
            results_rx,
            waker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn displayed(&self) -> Option<&Arc<S>> {
        self.displayed.as_ref()
    }

    pub fn state(&self) -> SchedulerState {
        match &self.pending {
            Some(pending) => SchedulerState::Computing {
                request: pending.id,
            },
            None => SchedulerState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Registers the waker to notify whenever a result is posted.
    pub fn set_waker(&self, waker: Waker) {
        *lock_waker(&self.waker) = Some(waker);
    }

    /// Requests that `source` become the displayed list. Returns immediately.
    ///
    /// Any request still pending is cancelled and its result will never be
    /// applied. An absent source is an empty list.
    pub fn submit(&mut self, source: Option<Arc<S>>) -> RequestId {
        if let Some(previous) = self.pending.take() {
            previous.token.cancel();
            log::debug!("request {} superseded", previous.id);
        }

        self.generation += 1;
        let id = RequestId(self.generation);
        let token = CancellationToken::new();
        let task = DiffTask {
            request: id,
            old: self.displayed.clone(),
            new: source.clone(),
            differ: Arc::clone(&self.differ),
            options: self.options.clone(),
            token: token.clone(),
            results: self.results_tx.clone(),
            waker: Arc::clone(&self.waker),
        };
        self.pending = Some(PendingRequest { id, source, token });

        log::trace!("request {id} submitted");
        self.gate.dispatch(id, Box::new(move || task.run()));
        id
    }

    /// Applies every posted result that is still current to `consumer`.
    ///
    /// Must be called on the consumer thread. Stale results are dropped.
    /// Returns how many scripts were applied (0 or 1 in practice).
    ///
    /// # Errors
    ///
    /// [`ReconcileError::InvalidViewState`] if the consumer rejects a script.
    /// The scheduler is left idle with the new source displayed.
    pub fn drain<C>(&mut self, consumer: &mut C) -> Result<usize, ReconcileError>
    where
        C: ListConsumer + ?Sized,
    {
        let mut applied = 0;
        while let Ok(outcome) = self.results_rx.try_recv() {
            if self.apply(outcome, consumer)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    fn apply<C>(&mut self, outcome: DiffOutcome, consumer: &mut C) -> Result<bool, ReconcileError>
    where
        C: ListConsumer + ?Sized,
    {
        let is_current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.id == outcome.request && !pending.token.is_cancelled());
        if !is_current {
            log::debug!("dropping stale result for request {}", outcome.request);
            return Ok(false);
        }
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };

        let script = match outcome.result {
            Ok(script) => script,
            Err(ReconcileError::Cancelled) => {
                log::debug!("dropping cancelled result for request {}", pending.id);
                return Ok(false);
            }
            Err(err) => {
                log::error!("diff for request {} failed: {err}", pending.id);
                return Ok(false);
            }
        };

        let snapshot = consumer.save_position();
        self.displayed = pending.source;
        if let Err(err) = consumer.on_update_ready(&script) {
            log::error!("consumer rejected request {}: {err}", pending.id);
            return Err(err);
        }

        if let Some(snapshot) = snapshot {
            let keys = if snapshot.has_key() {
                KeyIndex::build(self.displayed.as_deref())
            } else {
                KeyIndex::empty()
            };
            consumer.restore_position(&snapshot, &keys);
        }

        log::debug!(
            "applied request {}: {} ops, {} -> {} items",
            pending.id,
            script.ops().len(),
            script.old_len(),
            script.new_len()
        );
        Ok(true)
    }
}

impl<S, D: ?Sized> fmt::Debug for UpdateScheduler<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateScheduler")
            .field("generation", &self.generation)
            .field("pending", &self.pending.as_ref().map(|pending| pending.id))
            .field("has_displayed", &self.displayed.is_some())
            .finish_non_exhaustive()
    }
}

/// Everything one background diff needs, moved into the job.
struct DiffTask<S, D: ?Sized> {
    request: RequestId,
    old: Option<Arc<S>>,
    new: Option<Arc<S>>,
    differ: Arc<D>,
    options: DiffOptions,
    token: CancellationToken,
    results: Sender<DiffOutcome>,
    waker: SharedWaker,
}

impl<S, D> DiffTask<S, D>
where
    S: ItemSource,
    D: ItemDiffer<S::Item> + ?Sized,
{
    fn run(self) {
        if self.token.is_cancelled() {
            log::trace!("request {} cancelled before start", self.request);
            return;
        }

        let started = Instant::now();
        let callback =
            SourceDiffCallback::new(self.old.as_deref(), self.new.as_deref(), &*self.differ);
        let result = compute_cancellable(&callback, &self.options, &self.token);
        let elapsed = started.elapsed();

        // Last chance to stand down before the result becomes visible
        if self.token.is_cancelled() {
            log::trace!(
                "request {} cancelled after {}, result suppressed",
                self.request,
                format_elapsed(elapsed)
            );
            return;
        }
        log::debug!(
            "diff for request {} took {}",
            self.request,
            format_elapsed(elapsed)
        );

        let outcome = DiffOutcome {
            request: self.request,
            result,
        };
        if self.results.send(outcome).is_err() {
            log::trace!("scheduler dropped before request {} finished", self.request);
            return;
        }
        if let Some(waker) = lock_waker(&self.waker).as_ref() {
            waker.wake_by_ref();
        }
    }
}

fn lock_waker(waker: &Mutex<Option<Waker>>) -> std::sync::MutexGuard<'_, Option<Waker>> {
    waker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3}ms", elapsed.as_secs_f64() * 1000.0)
}
