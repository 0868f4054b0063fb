//! Error taxonomy for reconciliation.

use std::fmt;

/// The kind of edit a consumer was asked to perform when bounds were violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewOp {
    Insert,
    Remove,
    Move,
    Change,
    /// A positional read (binding, view type lookup).
    Read,
}

impl fmt::Display for ViewOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewOp::Insert => "insert",
            ViewOp::Remove => "remove",
            ViewOp::Move => "move",
            ViewOp::Change => "change",
            ViewOp::Read => "read",
        };
        f.write_str(name)
    }
}

/// Errors produced while computing or applying an edit script.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// The displayed state and an edit script (or a positional read) no longer
    /// agree. This is a programming error and must not be swallowed.
    #[error("invalid view state: {op} at position {position} with {len} displayed rows")]
    InvalidViewState {
        op: ViewOp,
        position: usize,
        len: usize,
    },

    /// The computation observed its cancellation token and stopped early.
    #[error("diff computation cancelled")]
    Cancelled,
}

impl ReconcileError {
    pub(crate) fn out_of_bounds(op: ViewOp, position: usize, len: usize) -> Self {
        ReconcileError::InvalidViewState { op, position, len }
    }

    /// Builds an [`ReconcileError::InvalidViewState`] for a positional read.
    pub fn invalid_read(position: usize, len: usize) -> Self {
        Self::out_of_bounds(ViewOp::Read, position, len)
    }

    /// Returns true for the supersession outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReconcileError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit_script::{EditOp, EditScript, ListUpdateCallback};
    use smallvec::SmallVec;
    use std::sync::Mutex;

    /// Keeps every error-level message logged by this test binary.
    struct ErrorCapture(Mutex<Vec<String>>);

    impl log::Log for ErrorCapture {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.level() == log::Level::Error
        }

        fn log(&self, record: &log::Record<'_>) {
            if self.enabled(record.metadata()) {
                let mut lines = self.0.lock().unwrap_or_else(|p| p.into_inner());
                lines.push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: ErrorCapture = ErrorCapture(Mutex::new(Vec::new()));

    fn logged_mentioning(needle: &str) -> usize {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Error);
        let lines = CAPTURE.0.lock().unwrap_or_else(|p| p.into_inner());
        lines.iter().filter(|line| line.contains(needle)).count()
    }

    struct Ignore;

    impl ListUpdateCallback for Ignore {
        fn on_inserted(&mut self, _: usize, _: usize) {}
        fn on_removed(&mut self, _: usize, _: usize) {}
        fn on_moved(&mut self, _: usize, _: usize) {}
        fn on_changed(&mut self, _: usize, _: usize) {}
    }

    #[test]
    fn test_building_an_error_does_not_log() {
        logged_mentioning("");
        let err = ReconcileError::invalid_read(987_654, 3);
        assert!(!err.is_cancelled());
        assert_eq!(logged_mentioning("987654"), 0);
    }

    #[test]
    fn test_rejected_dispatch_logs_once() {
        logged_mentioning("");
        let script = EditScript::new(
            SmallVec::from_slice(&[EditOp::Insert {
                position: 876_543,
                count: 1,
            }]),
            0,
            1,
        );
        assert!(script.dispatch_to(&mut Ignore).is_err());
        assert_eq!(logged_mentioning("876543"), 1);
    }
}
