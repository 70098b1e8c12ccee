//! Compiler domain: roles, families, the knowledge base, and the data model
//! for compilers actually installed on this machine.

pub mod builtin;
mod family;
mod info;
mod installed;
mod knowledge;
mod role;
pub mod uid;

pub use family::{CompilerFamily, FamilyKind, FamilySignature, FlagTables};
pub use info::CompilerInfo;
pub use installed::{InstalledCompiler, InstalledCompilerFamily, InstalledCompilerSet, WrapperFlags};
pub use knowledge::KnowledgeBase;
pub use role::CompilerRole;
