//! Scroll position tracking that survives list updates.

use std::cell::RefCell;
use std::rc::Rc;

use relist_core::collections::map::HashMap;
use relist_core::ItemSource;

/// Scroll position of a list consumer.
///
/// Tracks the first visible row, how far it is scrolled off-screen and, when
/// known, the stable key of the item shown there. Before an edit script is
/// applied the scheduler captures a [`PositionSnapshot`]; afterwards the key
/// is looked up in the new list so the same item stays on top even when rows
/// were inserted or removed above it.
///
/// Cloning shares the underlying state.
#[derive(Clone, Debug, Default)]
pub struct ListPositionState {
    inner: Rc<RefCell<ListPositionInner>>,
}

#[derive(Debug, Default)]
struct ListPositionInner {
    first_visible_item_index: usize,
    first_visible_item_scroll_offset: f32,
    /// Key of the first visible item, if the source exposes stable ids.
    first_visible_item_key: Option<u64>,
}

impl ListPositionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_position(index: usize, scroll_offset: f32) -> Self {
        let state = Self::new();
        state.scroll_to_item(index, scroll_offset);
        state
    }

    pub fn first_visible_item_index(&self) -> usize {
        self.inner.borrow().first_visible_item_index
    }

    pub fn first_visible_item_scroll_offset(&self) -> f32 {
        self.inner.borrow().first_visible_item_scroll_offset
    }

    pub fn first_visible_item_key(&self) -> Option<u64> {
        self.inner.borrow().first_visible_item_key
    }

    /// Jumps to `index`. The key is forgotten until the next layout reports it.
    pub fn scroll_to_item(&self, index: usize, scroll_offset: f32) {
        let mut inner = self.inner.borrow_mut();
        inner.first_visible_item_index = index;
        inner.first_visible_item_scroll_offset = scroll_offset;
        inner.first_visible_item_key = None;
    }

    /// Records the position after a layout pass, along with the key of the
    /// first visible item.
    pub fn update_scroll_position_with_key(
        &self,
        index: usize,
        scroll_offset: f32,
        key: Option<u64>,
    ) {
        let mut inner = self.inner.borrow_mut();
        inner.first_visible_item_index = index;
        inner.first_visible_item_scroll_offset = scroll_offset;
        inner.first_visible_item_key = key;
    }

    pub fn snapshot(&self) -> PositionSnapshot {
        let inner = self.inner.borrow();
        PositionSnapshot {
            index: inner.first_visible_item_index,
            scroll_offset: inner.first_visible_item_scroll_offset,
            key: inner.first_visible_item_key,
        }
    }

    /// Restores `snapshot` against a list of `item_count` rows.
    ///
    /// If the snapshot's key is still present, the first visible index follows
    /// it. Otherwise the old index is clamped into the new bounds.
    ///
    /// Returns the resulting first visible index.
    pub fn restore(&self, snapshot: &PositionSnapshot, item_count: usize, keys: &KeyIndex) -> usize {
        let mut inner = self.inner.borrow_mut();
        let moved_to = snapshot.key.and_then(|key| keys.index_of(key));
        inner.first_visible_item_index = match moved_to {
            Some(index) => index,
            None => snapshot.index.min(item_count.saturating_sub(1)),
        };
        inner.first_visible_item_scroll_offset = snapshot.scroll_offset;
        inner.first_visible_item_key = moved_to.and(snapshot.key);
        inner.first_visible_item_index
    }
}

/// Position captured before an edit script is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionSnapshot {
    pub index: usize,
    pub scroll_offset: f32,
    pub key: Option<u64>,
}

impl PositionSnapshot {
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }
}

/// Stable id to position lookup for one source.
#[derive(Clone, Debug, Default)]
pub struct KeyIndex {
    positions: HashMap<u64, usize>,
}

impl KeyIndex {
    /// Index with no keys. Restoring against it always clamps.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Indexes every position of `source` that exposes a stable id. Reads ids
    /// only; items are never resolved.
    ///
    /// When an id repeats, the first position wins.
    pub fn build<S: ItemSource + ?Sized>(source: Option<&S>) -> Self {
        let Some(source) = source else {
            return Self::empty();
        };
        let mut positions = HashMap::default();
        for position in 0..source.size() {
            if let Some(id) = source.stable_id_at(position) {
                positions.entry(id).or_insert(position);
            }
        }
        Self { positions }
    }

    pub fn index_of(&self, key: u64) -> Option<usize> {
        self.positions.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
