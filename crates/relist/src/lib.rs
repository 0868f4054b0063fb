//! Asynchronous list reconciliation.
//!
//! `relist` computes minimal edit scripts between two versions of a list off
//! the consumer thread and applies only the newest one. This crate re-exports
//! the pieces:
//!
//! - [`relist_core`]: the diff engine, edit scripts and item contracts
//! - [`relist_foundation`]: the scheduler, executors and adapter row model
//!
//! ```
//! use std::sync::Arc;
//! use relist::prelude::*;
//!
//! #[derive(Default)]
//! struct Rows(usize);
//!
//! impl ListUpdateCallback for Rows {
//!     fn on_inserted(&mut self, _position: usize, count: usize) { self.0 += count; }
//!     fn on_removed(&mut self, _position: usize, count: usize) { self.0 -= count; }
//!     fn on_moved(&mut self, _from: usize, _to: usize) {}
//!     fn on_changed(&mut self, _position: usize, _count: usize) {}
//! }
//!
//! impl ListConsumer for Rows {}
//!
//! let differ = Arc::new(KeyedDiffer::new(|post: &(u32, &'static str)| post.0));
//! let mut adapter = ListAdapter::new(&ReconcilerConfig::default(), differ, Arc::new(InlineExecutor));
//! let mut rows = Rows::default();
//!
//! adapter.submit(Some(Arc::new(vec![(1, "hello"), (2, "world")])));
//! adapter.drain(&mut rows).unwrap();
//! // Two posts and the end-of-list row
//! assert_eq!(rows.0, 3);
//! assert_eq!(adapter.item_count(), 3);
//! ```

#[cfg(feature = "testing")]
pub use relist_testing as testing;

pub use relist_core::*;
pub use relist_foundation::*;

pub mod prelude {
    pub use relist_core::{
        CancellationToken, DiffOptions, DisplayedItem, EditOp, EditScript, FnDiffer, ItemDiffer,
        ItemSource, KeyedDiffer, ListUpdateCallback, ReconcileError,
    };
    pub use relist_foundation::{
        BoundRow, DiffExecutor, InlineExecutor, ListAdapter, ListConsumer, ListPositionState,
        LoadMoreStrategy, PagedList, ReconcilerConfig, RowType, SourceRequest, UpdateScheduler,
        WorkerExecutor,
    };
}
