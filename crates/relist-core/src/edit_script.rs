//! Edit scripts: the pure-data output of a diff.
//!
//! An [`EditScript`] is an ordered list of [`EditOp`]s that turns a rendering
//! of the old list into a rendering of the new one. Positions always refer to
//! the list as it stands when the op is applied, so ops must be replayed in
//! order.

use smallvec::SmallVec;

use crate::error::{ReconcileError, ViewOp};

/// One primitive list update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditOp {
    /// `count` new rows appear starting at `position`.
    Insert { position: usize, count: usize },
    /// `count` rows starting at `position` disappear.
    Remove { position: usize, count: usize },
    /// The row at `from` is taken out and reinserted at `to`.
    Move { from: usize, to: usize },
    /// `count` rows starting at `position` keep their identity but must be
    /// rebound.
    Change { position: usize, count: usize },
}

/// Receiver of positional list updates.
///
/// This is the boundary to the rendering layer; implementations translate
/// each call into their own notion of rows.
pub trait ListUpdateCallback {
    fn on_inserted(&mut self, position: usize, count: usize);

    fn on_removed(&mut self, position: usize, count: usize);

    fn on_moved(&mut self, from: usize, to: usize);

    fn on_changed(&mut self, position: usize, count: usize);
}

/// Immutable result of one diff computation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditScript {
    ops: SmallVec<[EditOp; 8]>,
    old_len: usize,
    new_len: usize,
}

impl EditScript {
    pub(crate) fn new(ops: SmallVec<[EditOp; 8]>, old_len: usize, new_len: usize) -> Self {
        Self {
            ops,
            old_len,
            new_len,
        }
    }

    /// Script for two lists that are already identical.
    pub fn unchanged(len: usize) -> Self {
        Self::new(SmallVec::new(), len, len)
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    /// Length of the list the script applies to.
    pub fn old_len(&self) -> usize {
        self.old_len
    }

    /// Length of the list after the script is applied.
    pub fn new_len(&self) -> usize {
        self.new_len
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of rows inserted across all insert ops.
    pub fn insert_count(&self) -> usize {
        self.sum(|op| match op {
            EditOp::Insert { count, .. } => *count,
            _ => 0,
        })
    }

    /// Number of rows removed across all remove ops.
    pub fn remove_count(&self) -> usize {
        self.sum(|op| match op {
            EditOp::Remove { count, .. } => *count,
            _ => 0,
        })
    }

    pub fn move_count(&self) -> usize {
        self.sum(|op| usize::from(matches!(op, EditOp::Move { .. })))
    }

    /// Number of rows changed in place across all change ops.
    pub fn change_count(&self) -> usize {
        self.sum(|op| match op {
            EditOp::Change { count, .. } => *count,
            _ => 0,
        })
    }

    fn sum(&self, f: impl Fn(&EditOp) -> usize) -> usize {
        self.ops.iter().map(f).sum()
    }

    /// Replays the script into `callback`, checking every op against the
    /// running row count first.
    ///
    /// The callback must currently display `old_len` rows. An op that would
    /// reach outside the rows means the displayed state and this script have
    /// desynchronized; dispatch stops at that op with
    /// [`ReconcileError::InvalidViewState`].
    pub fn dispatch_to<C>(&self, callback: &mut C) -> Result<(), ReconcileError>
    where
        C: ListUpdateCallback + ?Sized,
    {
        self.replay(callback).inspect_err(|err| {
            log::error!(
                "edit script ({} -> {} rows) rejected: {err}",
                self.old_len,
                self.new_len
            );
        })
    }

    fn replay<C>(&self, callback: &mut C) -> Result<(), ReconcileError>
    where
        C: ListUpdateCallback + ?Sized,
    {
        let mut len = self.old_len;
        for op in &self.ops {
            match *op {
                EditOp::Insert { position, count } => {
                    if position > len {
                        return Err(ReconcileError::out_of_bounds(ViewOp::Insert, position, len));
                    }
                    callback.on_inserted(position, count);
                    len += count;
                }
                EditOp::Remove { position, count } => {
                    if position + count > len {
                        return Err(ReconcileError::out_of_bounds(ViewOp::Remove, position, len));
                    }
                    callback.on_removed(position, count);
                    len -= count;
                }
                EditOp::Move { from, to } => {
                    if from >= len || to >= len {
                        return Err(ReconcileError::out_of_bounds(
                            ViewOp::Move,
                            from.max(to),
                            len,
                        ));
                    }
                    callback.on_moved(from, to);
                }
                EditOp::Change { position, count } => {
                    if position + count > len {
                        return Err(ReconcileError::out_of_bounds(ViewOp::Change, position, len));
                    }
                    callback.on_changed(position, count);
                }
            }
        }
        debug_assert_eq!(len, self.new_len);
        Ok(())
    }
}

/// Accumulates ops, merging contiguous runs of the same kind.
#[derive(Default)]
pub(crate) struct ScriptBuilder {
    ops: SmallVec<[EditOp; 8]>,
}

impl ScriptBuilder {
    /// Records a removal. Callers emit removals from the highest position down,
    /// so a new removal directly before the previous one extends it.
    pub(crate) fn remove(&mut self, position: usize) {
        if let Some(EditOp::Remove {
            position: last,
            count,
        }) = self.ops.last_mut()
        {
            if position + 1 == *last {
                *last = position;
                *count += 1;
                return;
            }
        }
        self.ops.push(EditOp::Remove { position, count: 1 });
    }

    pub(crate) fn insert(&mut self, position: usize) {
        if let Some(EditOp::Insert {
            position: last,
            count,
        }) = self.ops.last_mut()
        {
            if *last + *count == position {
                *count += 1;
                return;
            }
        }
        self.ops.push(EditOp::Insert { position, count: 1 });
    }

    pub(crate) fn change(&mut self, position: usize) {
        if let Some(EditOp::Change {
            position: last,
            count,
        }) = self.ops.last_mut()
        {
            if *last + *count == position {
                *count += 1;
                return;
            }
        }
        self.ops.push(EditOp::Change { position, count: 1 });
    }

    pub(crate) fn move_item(&mut self, from: usize, to: usize) {
        self.ops.push(EditOp::Move { from, to });
    }

    pub(crate) fn build(self, old_len: usize, new_len: usize) -> EditScript {
        EditScript::new(self.ops, old_len, new_len)
    }
}
