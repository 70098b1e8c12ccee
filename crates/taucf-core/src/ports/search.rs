//! Search-path resolution port.

use std::path::PathBuf;

/// Locates commands the way a shell would.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait PathResolver: Send + Sync {
    /// Absolute path of `command`, or `None` when it is not on the search
    /// path. Commands containing a path separator are checked directly.
    fn which(&self, command: &str) -> Option<PathBuf>;
}
