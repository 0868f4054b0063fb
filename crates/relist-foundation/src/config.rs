//! Reconciler configuration.

use relist_core::diff::{DiffOptions, DEFAULT_CHECK_INTERVAL};

/// Default name of the background diff thread.
pub const DEFAULT_WORKER_THREAD_NAME: &str = "relist-diff";

/// Configuration shared by the scheduler and the adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Report reordered items as moves rather than remove + insert.
    pub detect_moves: bool,

    /// Diff steps between two cancellation checks.
    pub cancellation_check_interval: usize,

    /// Append a trailing end-of-list row to non-empty lists.
    pub end_of_list_indicator: bool,

    /// Thread name used by [`WorkerExecutor`](crate::WorkerExecutor).
    pub worker_thread_name: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            detect_moves: true,
            cancellation_check_interval: DEFAULT_CHECK_INTERVAL,
            end_of_list_indicator: true,
            worker_thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
        }
    }
}

impl ReconcilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect_moves(mut self, detect_moves: bool) -> Self {
        self.detect_moves = detect_moves;
        self
    }

    pub fn cancellation_check_interval(mut self, interval: usize) -> Self {
        self.cancellation_check_interval = interval.max(1);
        self
    }

    pub fn end_of_list_indicator(mut self, enabled: bool) -> Self {
        self.end_of_list_indicator = enabled;
        self
    }

    pub fn worker_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker_thread_name = name.into();
        self
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            detect_moves: self.detect_moves,
            check_interval: self.cancellation_check_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconcilerConfig::default();
        assert!(config.detect_moves);
        assert!(config.end_of_list_indicator);
        assert_eq!(config.worker_thread_name, "relist-diff");
        assert_eq!(config.diff_options(), DiffOptions::default());
    }

    #[test]
    fn test_builder() {
        let config = ReconcilerConfig::new()
            .detect_moves(false)
            .cancellation_check_interval(0)
            .end_of_list_indicator(false)
            .worker_thread_name("posts-diff");

        assert_eq!(config.cancellation_check_interval, 1);
        assert_eq!(
            config.diff_options(),
            DiffOptions {
                detect_moves: false,
                check_interval: 1,
            }
        );
        assert_eq!(config.worker_thread_name, "posts-diff");
    }
}
