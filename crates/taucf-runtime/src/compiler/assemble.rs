//! Compiler set assembly: one compiler per role from overrides, scanned
//! families, or host defaults.

use std::collections::BTreeMap;
use std::sync::Arc;

use taucf_core::{
    CfResult, CompilerRole, HostEnvironment, InstalledCompiler, InstalledCompilerFamily,
    InstalledCompilerSet,
};
use tracing::debug;

use super::cache::CompilerCache;

/// Picks the compiler for every role the knowledge base defines.
pub struct CompilerSetAssembler<'a> {
    cache: &'a CompilerCache,
    host: &'a HostEnvironment,
}

impl<'a> CompilerSetAssembler<'a> {
    pub const fn new(cache: &'a CompilerCache, host: &'a HostEnvironment) -> Self {
        Self { cache, host }
    }

    /// Assemble a compiler set.
    ///
    /// For each role, in order of preference: the explicit override (a
    /// command name or path; failures propagate), the preferred compiler of
    /// the first family in `families` that fills the role, then the host's
    /// default command. Missing required roles are reported together.
    pub fn assemble(
        &self,
        overrides: &BTreeMap<CompilerRole, String>,
        families: &[InstalledCompilerFamily],
    ) -> CfResult<InstalledCompilerSet> {
        let kb = self.cache.prober().knowledge_base();
        let mut members: BTreeMap<CompilerRole, Arc<InstalledCompiler>> = BTreeMap::new();

        for (role, command) in overrides {
            let compiler = self.cache.resolve_command(command, Some(*role), None)?;
            debug!(role = role.keyword(), path = %compiler.absolute_path().display(), "override");
            members.insert(*role, compiler);
        }

        for role in kb.roles() {
            if members.contains_key(role) {
                continue;
            }
            if let Some(compiler) = families.iter().find_map(|f| f.preferred(*role).ok()) {
                debug!(
                    role = role.keyword(),
                    path = %compiler.absolute_path().display(),
                    "from {} family",
                    compiler.family().name()
                );
                members.insert(*role, Arc::clone(compiler));
                continue;
            }
            if let Some(compiler) = self.host_default(*role)? {
                members.insert(*role, compiler);
            }
        }

        InstalledCompilerSet::new(kb, members)
    }

    fn host_default(&self, role: CompilerRole) -> CfResult<Option<Arc<InstalledCompiler>>> {
        let Some(command) = self.host.default_command(role) else {
            return Ok(None);
        };
        match self.cache.resolve_command(command, Some(role), None) {
            Ok(compiler) => {
                debug!(role = role.keyword(), command, "host default");
                Ok(Some(compiler))
            }
            Err(err) if err.is_recoverable() => {
                debug!(role = role.keyword(), command, "no host default: {err}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
