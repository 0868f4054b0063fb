//! Scheduling and adapter glue for relist.
//!
//! Diffs run on a [`DiffExecutor`]; their results are applied on the
//! consumer's thread by [`UpdateScheduler::drain`]. [`ListAdapter`] adds the
//! row model (loading placeholders, end-of-list row) on top.

pub mod adapter;
pub mod config;
pub mod executor;
pub mod list_state;
pub mod paging;
pub mod scheduler;

pub use adapter::{BoundRow, ListAdapter, RowType};
pub use config::{ReconcilerConfig, DEFAULT_WORKER_THREAD_NAME};
pub use executor::{DiffExecutor, DiffJob, InlineExecutor, SpawnExecutor, WorkerExecutor};
pub use list_state::{KeyIndex, ListPositionState, PositionSnapshot};
pub use paging::{LoadMoreStrategy, PagedList, SourceRequest};
pub use scheduler::{ListConsumer, RequestId, SchedulerState, UpdateScheduler};
