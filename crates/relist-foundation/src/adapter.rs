//! Row model on top of an [`UpdateScheduler`].
//!
//! [`ListAdapter`] maps the displayed source to the rows a list view shows:
//! one row per position (loaded or still loading) plus, for non-empty lists,
//! a trailing end-of-list row. It forwards edit scripts to the consumer and
//! keeps the indicator row in step with them, so the consumer's row count
//! always equals [`ListAdapter::item_count`].

use std::sync::Arc;
use std::task::Waker;

use relist_core::{
    size_of, DisplayedItem, EditScript, ItemDiffer, ItemSource, ListUpdateCallback,
    ReconcileError,
};
use smallvec::SmallVec;

use crate::config::ReconcilerConfig;
use crate::executor::DiffExecutor;
use crate::list_state::{KeyIndex, PositionSnapshot};
use crate::scheduler::{ListConsumer, RequestId, SchedulerState, UpdateScheduler};

/// What kind of row sits at a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowType {
    Item,
    /// The item is not loaded yet.
    Loading,
    /// Trailing end-of-list indicator.
    EndOfList,
}

/// A row ready to be rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundRow<T> {
    Item(T),
    Loading,
    EndOfList,
}

impl<T> BoundRow<T> {
    pub fn row_type(&self) -> RowType {
        match self {
            BoundRow::Item(_) => RowType::Item,
            BoundRow::Loading => RowType::Loading,
            BoundRow::EndOfList => RowType::EndOfList,
        }
    }
}

/// Adapter glue between an item source and a list view.
pub struct ListAdapter<S, D: ?Sized> {
    scheduler: UpdateScheduler<S, D>,
    end_of_list_indicator: bool,
}

impl<S, D> ListAdapter<S, D>
where
    S: ItemSource + Send + Sync + 'static,
    D: ItemDiffer<S::Item> + Send + Sync + ?Sized + 'static,
{
    pub fn new(config: &ReconcilerConfig, differ: Arc<D>, executor: Arc<dyn DiffExecutor>) -> Self {
        Self {
            scheduler: UpdateScheduler::new(config, differ, executor),
            end_of_list_indicator: config.end_of_list_indicator,
        }
    }

    pub fn scheduler(&self) -> &UpdateScheduler<S, D> {
        &self.scheduler
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn set_waker(&self, waker: Waker) {
        self.scheduler.set_waker(waker);
    }

    pub fn submit(&mut self, source: Option<Arc<S>>) -> RequestId {
        self.scheduler.submit(source)
    }

    /// Applies the newest finished update to `consumer`, including the
    /// indicator row bookkeeping.
    pub fn drain<C>(&mut self, consumer: &mut C) -> Result<usize, ReconcileError>
    where
        C: ListConsumer + ?Sized,
    {
        let mut rows = RowConsumer {
            inner: consumer,
            end_of_list_indicator: self.end_of_list_indicator,
        };
        self.scheduler.drain(&mut rows)
    }

    fn displayed(&self) -> Option<&S> {
        self.scheduler.displayed().map(|source| &**source)
    }

    // Items only; see item_count for rows
    pub fn size(&self) -> usize {
        size_of(self.displayed())
    }

    /// Number of rows, including the end-of-list row when shown.
    pub fn item_count(&self) -> usize {
        rows_for(self.size(), self.end_of_list_indicator)
    }

    fn is_indicator_row(&self, row: usize) -> bool {
        self.end_of_list_indicator && row == self.size()
    }

    fn check_row(&self, row: usize) -> Result<(), ReconcileError> {
        let count = self.item_count();
        if row >= count {
            return Err(ReconcileError::invalid_read(row, count));
        }
        Ok(())
    }

    /// Row type at `row`. Missing items are fetched but no page is requested.
    pub fn item_view_type(&self, row: usize) -> Result<RowType, ReconcileError> {
        self.check_row(row)?;
        if self.is_indicator_row(row) {
            return Ok(RowType::EndOfList);
        }
        let resolved = self
            .displayed()
            .and_then(|source| source.get_item(row, true, false));
        Ok(if resolved.is_some() {
            RowType::Item
        } else {
            RowType::Loading
        })
    }

    /// Reads `row` for rendering. This is the only read that may fetch and
    /// paginate.
    pub fn bind_row(&self, row: usize) -> Result<BoundRow<S::Item>, ReconcileError> {
        self.check_row(row)?;
        if self.is_indicator_row(row) {
            return Ok(BoundRow::EndOfList);
        }
        Ok(self
            .displayed()
            .and_then(|source| source.get_item(row, true, true))
            .map_or(BoundRow::Loading, BoundRow::Item))
    }

    /// Item at `position` without fetching or paginating.
    pub fn current_displayed_item(
        &self,
        position: usize,
    ) -> Result<DisplayedItem<S::Item>, ReconcileError> {
        let size = self.size();
        if position >= size {
            return Err(ReconcileError::invalid_read(position, size));
        }
        Ok(self
            .displayed()
            .and_then(|source| source.get_item(position, false, false))
            .into())
    }

    /// Positions whose loaded item satisfies `predicate`. Unloaded positions
    /// never match.
    pub fn positions_matching<F>(&self, mut predicate: F) -> SmallVec<[usize; 8]>
    where
        F: FnMut(&S::Item) -> bool,
    {
        let Some(source) = self.displayed() else {
            return SmallVec::new();
        };
        (0..source.size())
            .filter(|&position| {
                source
                    .get_item(position, false, false)
                    .is_some_and(|item| predicate(&item))
            })
            .collect()
    }

    /// Marks every row whose loaded item satisfies `predicate` as changed.
    /// Returns how many rows were refreshed.
    pub fn refresh_matching<C, F>(&self, consumer: &mut C, predicate: F) -> usize
    where
        C: ListUpdateCallback + ?Sized,
        F: FnMut(&S::Item) -> bool,
    {
        let positions = self.positions_matching(predicate);
        for &position in &positions {
            consumer.on_changed(position, 1);
        }
        positions.len()
    }

    pub fn position_of_stable_id(&self, id: u64) -> Option<usize> {
        let source = self.displayed()?;
        (0..source.size()).find(|&position| source.stable_id_at(position) == Some(id))
    }
}

impl<S, D: ?Sized> std::fmt::Debug for ListAdapter<S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListAdapter")
            .field("scheduler", &self.scheduler)
            .field("end_of_list_indicator", &self.end_of_list_indicator)
            .finish()
    }
}

fn rows_for(size: usize, end_of_list_indicator: bool) -> usize {
    if end_of_list_indicator && size > 0 {
        size + 1
    } else {
        size
    }
}

/// Forwards to the real consumer and adds or drops the indicator row when the
/// list becomes non-empty or empty.
struct RowConsumer<'c, C: ?Sized> {
    inner: &'c mut C,
    end_of_list_indicator: bool,
}

impl<C: ListConsumer + ?Sized> ListUpdateCallback for RowConsumer<'_, C> {
    fn on_inserted(&mut self, position: usize, count: usize) {
        self.inner.on_inserted(position, count);
    }

    fn on_removed(&mut self, position: usize, count: usize) {
        self.inner.on_removed(position, count);
    }

    fn on_moved(&mut self, from: usize, to: usize) {
        self.inner.on_moved(from, to);
    }

    fn on_changed(&mut self, position: usize, count: usize) {
        self.inner.on_changed(position, count);
    }
}

impl<C: ListConsumer + ?Sized> ListConsumer for RowConsumer<'_, C> {
    fn on_update_ready(&mut self, script: &EditScript) -> Result<(), ReconcileError> {
        self.inner.on_update_ready(script)?;
        if !self.end_of_list_indicator {
            return Ok(());
        }
        match (script.old_len(), script.new_len()) {
            (0, new_len) if new_len > 0 => self.inner.on_inserted(new_len, 1),
            (old_len, 0) if old_len > 0 => self.inner.on_removed(0, 1),
            _ => {}
        }
        Ok(())
    }

    fn save_position(&mut self) -> Option<PositionSnapshot> {
        self.inner.save_position()
    }

    fn restore_position(&mut self, snapshot: &PositionSnapshot, keys: &KeyIndex) {
        self.inner.restore_position(snapshot, keys);
    }
}
