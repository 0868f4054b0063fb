//! A fake list view that checks every update it receives.

use relist_core::{ItemDiffer, ItemSource, ListUpdateCallback, ReconcileError};
use relist_foundation::{
    BoundRow, KeyIndex, ListAdapter, ListConsumer, ListPositionState, PositionSnapshot, RowType,
};

/// Counters of positional callbacks received.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub inserted: usize,
    pub removed: usize,
    pub moved: usize,
    pub changed: usize,
    /// Edit scripts applied through `on_update_ready`.
    pub updates: usize,
}

/// In-memory stand-in for a list view.
///
/// Rows keep whatever was last bound into them. Inserted and changed rows are
/// dirty until [`bind_dirty`](Self::bind_dirty) rebinds them from an adapter;
/// moved rows carry their binding along. Every callback is checked against
/// the current row count and panics on violation.
#[derive(Debug)]
pub struct RenderedList<T> {
    rows: Vec<Option<BoundRow<T>>>,
    position: ListPositionState,
    stats: RenderStats,
}

impl<T> Default for RenderedList<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            position: ListPositionState::new(),
            stats: RenderStats::default(),
        }
    }
}

impl<T: Clone> RenderedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn position(&self) -> &ListPositionState {
        &self.position
    }

    /// Rows waiting to be rebound.
    pub fn dirty_rows(&self) -> usize {
        self.rows.iter().filter(|row| row.is_none()).count()
    }

    pub fn row(&self, index: usize) -> Option<&BoundRow<T>> {
        self.rows.get(index).and_then(Option::as_ref)
    }

    /// Row types as displayed; `None` for dirty rows.
    pub fn row_types(&self) -> Vec<Option<RowType>> {
        self.rows
            .iter()
            .map(|row| row.as_ref().map(BoundRow::row_type))
            .collect()
    }

    /// Items of every bound item row, in display order.
    pub fn items(&self) -> Vec<T> {
        self.rows
            .iter()
            .filter_map(|row| match row {
                Some(BoundRow::Item(item)) => Some(item.clone()),
                _ => None,
            })
            .collect()
    }

    /// Rebinds every dirty row from `adapter`, like a view laying out.
    /// Returns how many rows were bound.
    pub fn bind_dirty<S, D>(&mut self, adapter: &ListAdapter<S, D>) -> Result<usize, ReconcileError>
    where
        S: ItemSource<Item = T> + Send + Sync + 'static,
        D: ItemDiffer<T> + Send + Sync + ?Sized + 'static,
    {
        let mut bound = 0;
        for (index, row) in self.rows.iter_mut().enumerate() {
            if row.is_none() {
                *row = Some(adapter.bind_row(index)?);
                bound += 1;
            }
        }
        Ok(bound)
    }

    /// Rebinds every row, dirty or not.
    pub fn invalidate_all(&mut self) {
        self.rows.iter_mut().for_each(|row| *row = None);
    }

    fn check(&self, what: &str, end: usize) {
        assert!(
            end <= self.rows.len(),
            "{what} reaches row {end} but only {} rows are displayed",
            self.rows.len()
        );
    }
}

impl<T: Clone> ListUpdateCallback for RenderedList<T> {
    fn on_inserted(&mut self, position: usize, count: usize) {
        self.check("insert", position);
        self.rows
            .splice(position..position, std::iter::repeat_with(|| None).take(count));
        self.stats.inserted += count;
    }

    fn on_removed(&mut self, position: usize, count: usize) {
        self.check("remove", position + count);
        self.rows.drain(position..position + count);
        self.stats.removed += count;
    }

    fn on_moved(&mut self, from: usize, to: usize) {
        self.check("move", from.max(to) + 1);
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
        self.stats.moved += 1;
    }

    fn on_changed(&mut self, position: usize, count: usize) {
        self.check("change", position + count);
        self.rows[position..position + count].fill(None);
        self.stats.changed += count;
    }
}

impl<T: Clone> ListConsumer for RenderedList<T> {
    fn on_update_ready(&mut self, script: &relist_core::EditScript) -> Result<(), ReconcileError> {
        self.stats.updates += 1;
        script.dispatch_to(self)
    }

    fn save_position(&mut self) -> Option<PositionSnapshot> {
        Some(self.position.snapshot())
    }

    fn restore_position(&mut self, snapshot: &PositionSnapshot, keys: &KeyIndex) {
        self.position.restore(snapshot, self.rows.len(), keys);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moves_keep_binding() {
        let mut list = RenderedList::<u32>::new();
        list.on_inserted(0, 3);
        list.rows[0] = Some(BoundRow::Item(1));
        list.rows[2] = Some(BoundRow::Item(3));

        list.on_moved(0, 2);
        assert_eq!(list.row(2), Some(&BoundRow::Item(1)));
        assert_eq!(list.dirty_rows(), 1);

        list.on_changed(1, 1);
        assert_eq!(list.row(1), None);
        assert_eq!(list.items(), vec![1]);
        assert_eq!(
            list.stats(),
            RenderStats {
                inserted: 3,
                moved: 1,
                changed: 1,
                ..RenderStats::default()
            }
        );
    }

    #[test]
    #[should_panic(expected = "only 1 rows are displayed")]
    fn test_out_of_bounds_panics() {
        let mut list = RenderedList::<u32>::new();
        list.on_inserted(0, 1);
        list.on_removed(0, 2);
    }
}
