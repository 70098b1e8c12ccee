//! Family scanning: which of a family's compilers are installed here.

use std::sync::Arc;

use taucf_core::{CfResult, CompilerFamily, CompilerInfo, InstalledCompilerFamily};
use tracing::{debug, warn};

use super::cache::CompilerCache;

/// Searches the path for every alias a family declares.
pub struct FamilyScanner<'a> {
    cache: &'a CompilerCache,
}

impl<'a> FamilyScanner<'a> {
    pub const fn new(cache: &'a CompilerCache) -> Self {
        Self { cache }
    }

    /// Build the installed view of `family`.
    ///
    /// Aliases missing from the path are skipped silently. Aliases that are
    /// present but unusable are logged and skipped. Internal errors abort the
    /// scan.
    pub fn scan(&self, family: &Arc<CompilerFamily>) -> CfResult<InstalledCompilerFamily> {
        let resolver = self.cache.prober().resolver();
        let mut installed = InstalledCompilerFamily::new(Arc::clone(family));
        for (role, aliases) in family.members() {
            for alias in aliases {
                let Some(path) = resolver.which(alias) else {
                    continue;
                };
                let info = CompilerInfo::new(Arc::clone(family), *role, alias.as_str());
                match self.cache.get_or_create(&path, &info) {
                    Ok(compiler) => {
                        debug!(
                            role = role.keyword(),
                            path = %path.display(),
                            "found {}",
                            info.short_descr()
                        );
                        installed.add(*role, compiler);
                    }
                    Err(err) if err.is_recoverable() => {
                        warn!("Skipping {} at '{}': {err}", info.short_descr(), path.display());
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(installed)
    }
}
