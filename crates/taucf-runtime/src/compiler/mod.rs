//! Compiler resolution: probing, caching, scanning and set assembly.

mod assemble;
mod cache;
mod error;
mod probe;
mod scan;

pub use assemble::CompilerSetAssembler;
pub use cache::CompilerCache;
pub use error::ProbeError;
pub use probe::{CompilerProber, ResolveWrapped, candidate_lines, parse_wrapper_args};
pub use scan::FamilyScanner;
