//! A paged, partially-loaded [`ItemSource`].
//!
//! [`PagedList`] is one immutable page snapshot: some slots hold data, some are
//! still unloaded. Reads made by the rendering side can ask for missing data
//! or for the next page; those wishes are queued as [`SourceRequest`]s for the
//! host to act on. Reads made by the diff engine never queue anything.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use relist_core::collections::map::HashSet;
use relist_core::ItemSource;

/// When to ask for the next page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadMoreStrategy {
    /// Reading one of the last `threshold` positions asks for more.
    /// Default is 5.
    pub threshold: usize,

    /// Whether load-more requests are recorded at all.
    pub enabled: bool,
}

impl Default for LoadMoreStrategy {
    fn default() -> Self {
        Self {
            threshold: 5,
            enabled: true,
        }
    }
}

impl LoadMoreStrategy {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            threshold: 0,
            enabled: false,
        }
    }
}

/// Work a [`PagedList`] wants its host to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceRequest {
    /// Load the item at this position.
    Fetch(usize),
    /// Load the next page.
    LoadMore,
}

#[derive(Debug, Default)]
struct Requests {
    queue: VecDeque<SourceRequest>,
    fetching: HashSet<usize>,
    load_more_requested: bool,
}

/// Snapshot of a paged list.
///
/// A changed data set is a new `PagedList`; load-more is therefore requested
/// at most once per snapshot (once per page), and each missing position is
/// fetched at most once.
#[derive(Debug)]
pub struct PagedList<T> {
    slots: Vec<Option<T>>,
    stable_ids: Vec<Option<u64>>,
    has_more: bool,
    strategy: LoadMoreStrategy,
    requests: Mutex<Requests>,
}

impl<T> PagedList<T> {
    /// Creates a snapshot where `None` slots are not loaded yet.
    pub fn new(slots: Vec<Option<T>>) -> Self {
        Self {
            slots,
            stable_ids: Vec::new(),
            has_more: false,
            strategy: LoadMoreStrategy::default(),
            requests: Mutex::new(Requests::default()),
        }
    }

    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        Self::new(items.into_iter().map(Some).collect())
    }

    /// Stable ids per position. Missing entries mean "no id".
    pub fn with_stable_ids(mut self, stable_ids: Vec<Option<u64>>) -> Self {
        self.stable_ids = stable_ids;
        self
    }

    /// Whether another page exists beyond this snapshot.
    pub fn with_has_more(mut self, has_more: bool) -> Self {
        self.has_more = has_more;
        self
    }

    pub fn with_load_more_strategy(mut self, strategy: LoadMoreStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Removes and returns every queued request, oldest first.
    pub fn take_requests(&self) -> Vec<SourceRequest> {
        self.lock_requests().queue.drain(..).collect()
    }

    pub fn pending_requests(&self) -> usize {
        self.lock_requests().queue.len()
    }

    fn is_near_end(&self, position: usize) -> bool {
        self.strategy.enabled && self.has_more && position + self.strategy.threshold >= self.slots.len()
    }

    fn lock_requests(&self) -> MutexGuard<'_, Requests> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> ItemSource for PagedList<T> {
    type Item = T;

    fn size(&self) -> usize {
        self.slots.len()
    }

    fn get_item(
        &self,
        position: usize,
        fetch_if_absent: bool,
        paginate_if_near_end: bool,
    ) -> Option<T> {
        let slot = self.slots.get(position)?;

        if fetch_if_absent && slot.is_none() {
            let mut requests = self.lock_requests();
            if requests.fetching.insert(position) {
                log::trace!("requesting item {position}");
                requests.queue.push_back(SourceRequest::Fetch(position));
            }
        }
        if paginate_if_near_end && self.is_near_end(position) {
            let mut requests = self.lock_requests();
            if !requests.load_more_requested {
                requests.load_more_requested = true;
                log::trace!("requesting next page at {position}/{}", self.slots.len());
                requests.queue.push_back(SourceRequest::LoadMore);
            }
        }

        slot.clone()
    }

    fn stable_id_at(&self, position: usize) -> Option<u64> {
        self.stable_ids.get(position).copied().flatten()
    }
}
