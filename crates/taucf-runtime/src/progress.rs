//! Progress reporting for package installation.
//!
//! The install engine reports each lifecycle step here. Front ends plug in
//! their own reporter (the CLI draws a spinner); library callers and tests
//! use [`NoopProgress`].

/// Receives progress updates during long-running operations.
pub trait ProgressReporter: Send + Sync {
    /// An operation with `total` steps (if known) is starting.
    fn start(&self, message: &str, total: Option<u64>);

    /// Step `current` of the operation is starting.
    fn update(&self, current: u64, message: &str);

    /// Free-form status line.
    fn message(&self, msg: &str);

    /// The operation succeeded.
    fn finish(&self, message: &str);

    /// The operation failed.
    fn finish_with_error(&self, message: &str);
}

/// Ignores all updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _message: &str, _total: Option<u64>) {}
    fn update(&self, _current: u64, _message: &str) {}
    fn message(&self, _msg: &str) {}
    fn finish(&self, _message: &str) {}
    fn finish_with_error(&self, _message: &str) {}
}
