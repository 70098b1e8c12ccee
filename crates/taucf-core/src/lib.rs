//! Domain core of taucf.
//!
//! Holds the compiler knowledge base, the data model for installed
//! compilers and toolchains, UID hashing, target description, package
//! layout, and the ports the runtime implements. Nothing in this crate
//! spawns processes or touches the network.

pub mod compiler;
pub mod error;
pub mod host;
pub mod manifest;
pub mod package;
pub mod ports;
pub mod settings;

pub use compiler::{
    CompilerFamily, CompilerInfo, CompilerRole, FamilyKind, FamilySignature, FlagTables,
    InstalledCompiler, InstalledCompilerFamily, InstalledCompilerSet, KnowledgeBase, WrapperFlags,
};
pub use error::{CfError, CfResult, ErrorKind};
pub use host::{HostEnvironment, TargetArch, TargetOs};
pub use manifest::{InstallManifest, MANIFEST_FILE};
pub use package::{ArchiveKind, InstallLayout, SourceSpec, installation_uid};
pub use ports::{PathResolver, ProcessCommand, ProcessExecutor, ProcessOutput, SourceAcquirer};
pub use settings::{Settings, SettingsOverrides};
