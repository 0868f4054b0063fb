//! Core of relist: the list diff engine and its contracts.
//!
//! This crate is pure and thread-agnostic. It knows how to compare two
//! [`ItemSource`]s and turn the comparison into an [`EditScript`], but nothing
//! about threads, scheduling or rendering.
//!
//! # Example
//!
//! ```
//! use relist_core::{diff, EditOp, KeyedDiffer, SliceDiffCallback};
//!
//! let old = vec![(1, "A"), (2, "B")];
//! let new = vec![(2, "B"), (1, "A")];
//! let differ = KeyedDiffer::new(|item: &(u32, &str)| item.0);
//!
//! let script = diff::compute(
//!     &SliceDiffCallback::new(&old, &new, &differ),
//!     &diff::DiffOptions::default(),
//! );
//! assert_eq!(script.ops(), &[EditOp::Move { from: 0, to: 1 }]);
//! ```

pub mod callback;
pub mod cancel;
pub mod collections;
pub mod diff;
pub mod edit_script;
pub mod error;
pub mod item_source;

pub use callback::*;
pub use cancel::CancellationToken;
pub use diff::{compute, compute_cancellable, DiffOptions};
pub use edit_script::{EditOp, EditScript, ListUpdateCallback};
pub use error::{ReconcileError, ViewOp};
pub use item_source::*;
