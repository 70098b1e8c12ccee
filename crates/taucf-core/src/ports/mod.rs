//! Port definitions (trait abstractions) for external systems.
//!
//! Every component that shells out, searches `PATH`, or fetches sources
//! does so through one of these traits. Implementations live in
//! `taucf-runtime`; tests substitute mocks.

mod process;
mod search;
mod source;

pub use process::{ProcessCommand, ProcessExecutor, ProcessOutput};
pub use search::PathResolver;
pub use source::SourceAcquirer;

#[cfg(any(test, feature = "test-utils"))]
pub use process::MockProcessExecutor;
#[cfg(any(test, feature = "test-utils"))]
pub use search::MockPathResolver;
#[cfg(any(test, feature = "test-utils"))]
pub use source::MockSourceAcquirer;
