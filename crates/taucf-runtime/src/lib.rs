//! Active adapters for taucf: subprocess execution, search-path lookup,
//! compiler probing and toolchain assembly, and package installation.
#![deny(unsafe_code)]

pub mod compiler;
pub mod package;
pub mod process;
pub mod progress;
pub mod search;
pub mod toolchain;

// Re-export the port implementations
pub use process::SystemProcessExecutor;
pub use search::SearchPath;

// Re-export compiler resolution entry points
pub use compiler::{CompilerCache, CompilerProber, CompilerSetAssembler, FamilyScanner, ProbeError};
pub use toolchain::{Toolchain, ToolchainRequest};

// Re-export the installation framework
pub use package::{
    ArchiveAcquirer, FamilyProvider, InstallRequest, InstallServices, InstallState, Installation,
    PackageRecipe, PackageStatus, builtin_recipes, find_recipe,
};
pub use progress::{NoopProgress, ProgressReporter};
