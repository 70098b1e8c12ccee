//! Source acquisition port.

use std::path::{Path, PathBuf};

use crate::error::CfResult;
use crate::package::SourceSpec;

/// Fetches and unpacks package sources.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait SourceAcquirer: Send + Sync {
    /// Stage `source` below `destination` and return the unpacked source
    /// tree's root.
    ///
    /// Fails with a configuration error naming the source when it cannot be
    /// fetched or extracted.
    fn acquire(&self, source: &SourceSpec, destination: &Path) -> CfResult<PathBuf>;
}
