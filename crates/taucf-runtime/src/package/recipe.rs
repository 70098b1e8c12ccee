//! Per-package build knowledge plugged into the install engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use taucf_core::ports::PathResolver;
use taucf_core::{
    CfResult, CompilerRole, InstallLayout, InstalledCompilerSet, TargetArch, TargetOs,
};

use super::env::EnvContribution;

/// A file an installation must contain to be considered usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the install prefix.
    pub path: PathBuf,
    pub executable: bool,
}

impl Artifact {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            executable: false,
        }
    }

    pub fn executable(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            executable: true,
        }
    }
}

/// A host compiler family the package cannot be built with, and the family
/// to use instead for `roles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilySubstitution {
    pub incompatible: &'static str,
    pub substitute: &'static str,
    pub roles: &'static [CompilerRole],
}

/// Everything a recipe may consult while configuring.
pub struct ConfigureContext<'a> {
    pub os: TargetOs,
    pub arch: TargetArch,
    pub layout: &'a InstallLayout,
    /// Compilers after any family substitution.
    pub compilers: &'a InstalledCompilerSet,
    /// Root of the unpacked source tree.
    pub source_dir: &'a Path,
    pub resolver: &'a dyn PathResolver,
}

/// Package-specific configure arguments and environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureArgs {
    /// Appended after `--prefix`.
    pub flags: Vec<String>,
    /// Set for configure, build and install steps.
    pub env: BTreeMap<String, String>,
    /// Directories put in front of `PATH` for all steps.
    pub path_prepend: Vec<PathBuf>,
    /// Unset for all steps. Also suppresses the compiler variables the
    /// engine would otherwise export.
    pub env_remove: Vec<String>,
}

/// The deltas one package contributes to the generic autotools lifecycle.
pub trait PackageRecipe: Send + Sync {
    /// Short name used in paths and on the command line.
    fn name(&self) -> &'static str;

    /// Human-readable name.
    fn title(&self) -> &'static str;

    /// Download locations by architecture; `None` is the fallback.
    fn default_sources(&self) -> &'static [(Option<TargetArch>, &'static str)];

    /// Files that must exist after a successful install.
    fn artifacts(&self) -> Vec<Artifact>;

    fn substitution(&self) -> Option<FamilySubstitution> {
        None
    }

    fn configure_args(&self, ctx: &ConfigureContext<'_>) -> CfResult<ConfigureArgs>;

    /// Runs after `make install` succeeded.
    fn post_install(&self, _ctx: &ConfigureContext<'_>) -> CfResult<()> {
        Ok(())
    }

    fn compiletime_env(&self, _layout: &InstallLayout, _os: TargetOs) -> EnvContribution {
        EnvContribution::default()
    }

    fn runtime_env(&self, _layout: &InstallLayout, _os: TargetOs) -> EnvContribution {
        EnvContribution::default()
    }
}
