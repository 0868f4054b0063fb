//! Property-based tests for the diff engine.

use std::cell::RefCell;

use proptest::prelude::*;
use relist_core::{
    compute, DiffOptions, EditScript, ItemDiffer, ItemSource, KeyedDiffer, ListUpdateCallback,
    SliceDiffCallback, SourceDiffCallback,
};

// =============================================================================
// Test helpers
// =============================================================================

type Row = (u8, char);

fn arbitrary_list() -> impl Strategy<Value = Vec<Row>> {
    // Small id space so lists share, repeat and reorder ids often
    prop::collection::vec((0u8..12, prop::char::range('a', 'c')), 0..24)
}

/// Rows hold whatever the consumer last bound; `None` means "needs binding".
struct Rendering<T> {
    rows: Vec<Option<T>>,
}

impl<T: Clone> ListUpdateCallback for Rendering<T> {
    fn on_inserted(&mut self, position: usize, count: usize) {
        self.rows
            .splice(position..position, std::iter::repeat_with(|| None).take(count));
    }

    fn on_removed(&mut self, position: usize, count: usize) {
        self.rows.drain(position..position + count);
    }

    fn on_moved(&mut self, from: usize, to: usize) {
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
    }

    fn on_changed(&mut self, position: usize, count: usize) {
        self.rows[position..position + count].fill(None);
    }
}

fn render<T: Clone>(old: &[T], new: &[T], script: &EditScript) -> Vec<T> {
    let mut rendering = Rendering {
        rows: old.iter().cloned().map(Some).collect(),
    };
    script.dispatch_to(&mut rendering).unwrap();
    rendering
        .rows
        .into_iter()
        .enumerate()
        .map(|(pos, row)| row.unwrap_or_else(|| new[pos].clone()))
        .collect()
}

fn by_id() -> KeyedDiffer<fn(&Row) -> u8> {
    KeyedDiffer::new((|row: &Row| row.0) as fn(&Row) -> u8)
}

/// Differ that records every identity answer and checks content is only ever
/// asked about pairs it already accepted.
#[derive(Default)]
struct AuditingDiffer {
    accepted: RefCell<Vec<(Row, Row)>>,
    content_calls: RefCell<usize>,
}

impl ItemDiffer<Row> for AuditingDiffer {
    fn are_items_the_same(&self, old: &Row, new: &Row) -> bool {
        let same = old.0 == new.0;
        if same {
            self.accepted.borrow_mut().push((*old, *new));
        }
        same
    }

    fn are_contents_the_same(&self, old: &Row, new: &Row) -> bool {
        *self.content_calls.borrow_mut() += 1;
        assert!(
            self.accepted.borrow().contains(&(*old, *new)),
            "content compared for {old:?}/{new:?} without identity match"
        );
        old == new
    }
}

/// Source where some positions are not loaded yet.
struct Partial(Vec<Option<Row>>);

impl ItemSource for Partial {
    type Item = Row;

    fn size(&self) -> usize {
        self.0.len()
    }

    fn get_item(&self, position: usize, fetch: bool, paginate: bool) -> Option<Row> {
        assert!(!fetch && !paginate);
        self.0.get(position).copied().flatten()
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Replaying compute(A, B) over a rendering of A renders B.
    #[test]
    fn script_turns_old_rendering_into_new(old in arbitrary_list(), new in arbitrary_list()) {
        let differ = by_id();
        let callback = SliceDiffCallback::new(&old, &new, &differ);
        for options in [DiffOptions::default(), DiffOptions::without_moves()] {
            let script = compute(&callback, &options);
            prop_assert_eq!(script.old_len(), old.len());
            prop_assert_eq!(script.new_len(), new.len());
            prop_assert_eq!(render(&old, &new, &script), new.clone());
        }
    }

    /// compute(A, A) is empty.
    #[test]
    fn identical_lists_need_no_edits(list in arbitrary_list()) {
        let differ = by_id();
        let script = compute(&SliceDiffCallback::new(&list, &list, &differ), &DiffOptions::default());
        prop_assert!(script.is_empty(), "unexpected ops {:?}", script.ops());
    }

    /// Content equality is never consulted without a prior identity match.
    #[test]
    fn content_only_checked_after_identity(old in arbitrary_list(), new in arbitrary_list()) {
        let differ = AuditingDiffer::default();
        let script = compute(&SliceDiffCallback::new(&old, &new, &differ), &DiffOptions::default());
        prop_assert!(*differ.content_calls.borrow() <= old.len().min(new.len()));
        prop_assert_eq!(render(&old, &new, &script), new);
    }

    /// Unresolved positions are never matched, so they never move or change.
    #[test]
    fn unresolved_items_are_never_matched(
        old in prop::collection::vec(prop::option::of((0u8..4, Just('a'))), 0..12),
        new in prop::collection::vec(prop::option::of((0u8..4, Just('a'))), 0..12),
    ) {
        let old_source = Partial(old.clone());
        let new_source = Partial(new.clone());
        let differ = by_id();
        let callback = SourceDiffCallback::new(Some(&old_source), Some(&new_source), &differ);
        let script = compute(&callback, &DiffOptions::default());

        let unresolved_old = old.iter().filter(|row| row.is_none()).count();
        let unresolved_new = new.iter().filter(|row| row.is_none()).count();
        prop_assert!(script.remove_count() >= unresolved_old);
        prop_assert!(script.insert_count() >= unresolved_new);
        prop_assert_eq!(script.change_count(), 0);
    }
}

#[test]
fn fully_unloaded_lists_are_replaced_wholesale() {
    let old = Partial(vec![None, None, None]);
    let new = Partial(vec![None, None]);
    let differ = by_id();
    let script = compute(
        &SourceDiffCallback::new(Some(&old), Some(&new), &differ),
        &DiffOptions::default(),
    );
    assert_eq!(script.remove_count(), 3);
    assert_eq!(script.insert_count(), 2);
    assert_eq!(script.move_count(), 0);
}

#[test]
fn hundreds_of_items_with_scattered_edits() {
    let old: Vec<Row> = (0..200u32).map(|i| ((i % 250) as u8, 'a')).collect();
    let mut new = old.clone();
    new.retain(|row| row.0 % 7 != 0);
    new.reverse();
    new.truncate(150);
    new.insert(10, (230, 'b'));
    new[20].1 = 'c';

    let differ = by_id();
    let script = compute(&SliceDiffCallback::new(&old, &new, &differ), &DiffOptions::default());
    assert_eq!(render(&old, &new, &script), new);
}
