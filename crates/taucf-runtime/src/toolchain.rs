//! Toolchain facade wiring the knowledge base, identity cache, scanner and
//! assembler together for one run.

use std::collections::BTreeMap;
use std::sync::Arc;

use taucf_core::ports::{PathResolver, ProcessExecutor};
use taucf_core::{
    CfResult, CompilerFamily, CompilerRole, FamilyKind, HostEnvironment, InstalledCompiler,
    InstalledCompilerFamily, InstalledCompilerSet, KnowledgeBase,
};
use tracing::info;

use crate::compiler::{CompilerCache, CompilerProber, CompilerSetAssembler, FamilyScanner};
use crate::package::FamilyProvider;

/// What the user asked for when selecting compilers.
#[derive(Debug, Clone, Default)]
pub struct ToolchainRequest {
    /// Host family to fill host roles from; the host's preferred family when
    /// `None`.
    pub host_family: Option<String>,
    /// MPI family to fill MPI roles from; the host's preferred MPI family
    /// when `None`.
    pub mpi_family: Option<String>,
    /// Explicit command per role, taking precedence over both families.
    pub overrides: BTreeMap<CompilerRole, String>,
}

/// Owns the per-run compiler identity cache.
pub struct Toolchain {
    host: HostEnvironment,
    cache: CompilerCache,
}

impl Toolchain {
    pub fn new(
        kb: Arc<KnowledgeBase>,
        host: HostEnvironment,
        executor: Arc<dyn ProcessExecutor>,
        resolver: Arc<dyn PathResolver>,
    ) -> Self {
        let prober = CompilerProber::new(kb, executor, resolver);
        Self {
            host,
            cache: CompilerCache::new(prober),
        }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        self.cache.prober().knowledge_base()
    }

    pub const fn host(&self) -> &HostEnvironment {
        &self.host
    }

    pub const fn cache(&self) -> &CompilerCache {
        &self.cache
    }

    /// Resolve and probe one command.
    pub fn resolve(
        &self,
        command: &str,
        role: Option<CompilerRole>,
        family: Option<&CompilerFamily>,
    ) -> CfResult<Arc<InstalledCompiler>> {
        self.cache.resolve_command(command, role, family)
    }

    /// Scan one family by kind and name.
    pub fn scan(&self, kind: FamilyKind, name: &str) -> CfResult<InstalledCompilerFamily> {
        let family = self.knowledge_base().find_family(kind, name)?;
        FamilyScanner::new(&self.cache).scan(&family)
    }

    /// Assemble a complete compiler set for `request`.
    pub fn assemble(&self, request: &ToolchainRequest) -> CfResult<InstalledCompilerSet> {
        let host_family = request
            .host_family
            .as_deref()
            .unwrap_or(&self.host.preferred_family);
        let mpi_family = request
            .mpi_family
            .as_deref()
            .unwrap_or(&self.host.preferred_mpi_family);
        let families = [
            self.scan(FamilyKind::Host, host_family)?,
            self.scan(FamilyKind::Mpi, mpi_family)?,
        ];
        let set = CompilerSetAssembler::new(&self.cache, &self.host)
            .assemble(&request.overrides, &families)?;
        info!(uid = set.uid(), "assembled compiler set");
        Ok(set)
    }
}

impl FamilyProvider for Toolchain {
    fn installed_family(&self, kind: FamilyKind, name: &str) -> CfResult<InstalledCompilerFamily> {
        self.scan(kind, name)
    }
}
