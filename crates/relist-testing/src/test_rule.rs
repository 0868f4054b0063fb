use std::sync::Arc;
use std::time::Duration;

use relist_core::{ItemDiffer, ItemSource, ReconcileError};
use relist_foundation::{
    DiffExecutor, InlineExecutor, ListAdapter, ReconcilerConfig, RequestId, WorkerExecutor,
};

use crate::executor::SettleSignal;
use crate::rendered::RenderedList;

const MAX_SETTLE_ROUNDS: usize = 100;
const SETTLE_WAIT: Duration = Duration::from_millis(50);

/// Drives a [`ListAdapter`] into a [`RenderedList`] the way a UI loop would.
pub struct ReconcileTestRule<S: ItemSource, D: ?Sized> {
    adapter: ListAdapter<S, D>,
    rendered: RenderedList<S::Item>,
    signal: Arc<SettleSignal>,
}

impl<S, D> ReconcileTestRule<S, D>
where
    S: ItemSource + Send + Sync + 'static,
    D: ItemDiffer<S::Item> + Send + Sync + ?Sized + 'static,
{
    pub fn new(config: &ReconcilerConfig, differ: Arc<D>, executor: Arc<dyn DiffExecutor>) -> Self {
        let adapter = ListAdapter::new(config, differ, executor);
        let signal = SettleSignal::new();
        adapter.set_waker(signal.waker());
        Self {
            adapter,
            rendered: RenderedList::new(),
            signal,
        }
    }

    /// Rule backed by a real background worker thread.
    pub fn with_worker(config: &ReconcilerConfig, differ: Arc<D>) -> Self {
        let worker = WorkerExecutor::from_config(config)
            .unwrap_or_else(|err| panic!("failed to spawn diff worker: {err}"));
        Self::new(config, differ, Arc::new(worker))
    }

    /// Rule that computes diffs during `submit`.
    pub fn with_inline(config: &ReconcilerConfig, differ: Arc<D>) -> Self {
        Self::new(config, differ, Arc::new(InlineExecutor))
    }

    pub fn adapter(&self) -> &ListAdapter<S, D> {
        &self.adapter
    }

    pub fn rendered(&self) -> &RenderedList<S::Item> {
        &self.rendered
    }

    pub fn rendered_mut(&mut self) -> &mut RenderedList<S::Item> {
        &mut self.rendered
    }

    pub fn signal(&self) -> &SettleSignal {
        &self.signal
    }

    pub fn submit(&mut self, source: Option<Arc<S>>) -> RequestId {
        self.adapter.submit(source)
    }

    pub fn submit_list(&mut self, source: S) -> RequestId {
        self.submit(Some(Arc::new(source)))
    }

    /// One consumer-thread turn: applies whatever is ready, then binds.
    pub fn drain(&mut self) -> Result<usize, ReconcileError> {
        let applied = self.adapter.drain(&mut self.rendered)?;
        self.rendered.bind_dirty(&self.adapter)?;
        Ok(applied)
    }

    /// Drains until no request is pending and every row is bound.
    ///
    /// # Panics
    ///
    /// If the adapter rejects an update, or if nothing settles after
    /// 100 rounds.
    pub fn await_idle(&mut self) {
        let mut rounds = 0;
        loop {
            if let Err(err) = self.drain() {
                panic!("reconciliation failed: {err}");
            }
            if self.adapter.is_idle() {
                log::trace!("settled after {rounds} rounds");
                break;
            }
            self.signal.wait_timeout(SETTLE_WAIT);
            rounds += 1;
            if rounds > MAX_SETTLE_ROUNDS {
                panic!("Reconciliation failed to settle after {MAX_SETTLE_ROUNDS} rounds");
            }
        }
        self.assert_row_count();
    }

    /// The consumer shows exactly as many rows as the adapter reports.
    pub fn assert_row_count(&self) {
        assert_eq!(
            self.rendered.len(),
            self.adapter.item_count(),
            "rendered rows and adapter item count diverged"
        );
    }
}

impl<S: ItemSource, D: ?Sized> std::fmt::Debug for ReconcileTestRule<S, D>
where
    S::Item: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconcileTestRule")
            .field("adapter", &self.adapter)
            .field("rendered", &self.rendered)
            .finish_non_exhaustive()
    }
}
