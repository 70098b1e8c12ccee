//! Identity cache for installed compilers.
//!
//! Each `(absolute path, compiler info)` key is probed at most once; every
//! later request returns the same `Arc`. Reads of a populated entry take no
//! lock beyond the short map lookup. Initialization is serialized per key,
//! so unrelated keys can be probed concurrently and a wrapper probing its
//! wrapped compiler never waits on its own lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use taucf_core::{
    CfError, CfResult, CompilerFamily, CompilerInfo, CompilerRole, InstalledCompiler,
};
use tracing::{debug, warn};

use super::probe::CompilerProber;

type CacheKey = (PathBuf, CompilerInfo);

#[derive(Default)]
struct Slot {
    compiler: OnceLock<Arc<InstalledCompiler>>,
    init: Mutex<()>,
}

/// Memoizes probe results by `(path, info)`.
pub struct CompilerCache {
    prober: CompilerProber,
    slots: Mutex<HashMap<CacheKey, Arc<Slot>>>,
}

impl CompilerCache {
    pub fn new(prober: CompilerProber) -> Self {
        Self {
            prober,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub const fn prober(&self) -> &CompilerProber {
        &self.prober
    }

    /// The canonical installed compiler for `(absolute_path, info)`,
    /// probing it on first request.
    pub fn get_or_create(
        &self,
        absolute_path: &Path,
        info: &CompilerInfo,
    ) -> CfResult<Arc<InstalledCompiler>> {
        self.get_or_create_inner(absolute_path, info, &mut Vec::new())
    }

    fn get_or_create_inner(
        &self,
        absolute_path: &Path,
        info: &CompilerInfo,
        visiting: &mut Vec<CacheKey>,
    ) -> CfResult<Arc<InstalledCompiler>> {
        let key = (absolute_path.to_path_buf(), info.clone());
        if visiting.contains(&key) {
            return Err(CfError::configuration(format!(
                "'{}' wraps itself",
                absolute_path.display()
            )));
        }

        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        if let Some(compiler) = slot.compiler.get() {
            return Ok(Arc::clone(compiler));
        }

        let _guard = slot.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(compiler) = slot.compiler.get() {
            return Ok(Arc::clone(compiler));
        }

        debug!(path = %absolute_path.display(), "probing {}", info.short_descr());
        visiting.push(key);
        let probed = self.prober.probe(
            absolute_path,
            info,
            &mut |path: &Path, wrapped_info: &CompilerInfo| {
                self.get_or_create_inner(path, wrapped_info, visiting)
            },
        );
        visiting.pop();

        let compiler = Arc::new(probed?);
        Ok(Arc::clone(slot.compiler.get_or_init(|| compiler)))
    }

    /// Resolve a user-supplied command (bare name or path) to an installed
    /// compiler.
    ///
    /// The command is located on the search path, identified against the
    /// knowledge base (narrowed to `family` and `role` when given), and
    /// probed through the cache.
    pub fn resolve_command(
        &self,
        command: &str,
        role: Option<CompilerRole>,
        family: Option<&CompilerFamily>,
    ) -> CfResult<Arc<InstalledCompiler>> {
        let path = self.prober.resolver().which(command).ok_or_else(|| {
            CfError::configuration(format!("Compiler '{command}' not found"))
                .with_hint("Check that the command is installed and on PATH")
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let kb = self.prober.knowledge_base();
        let mut infos = match family {
            Some(family) => kb.find_info(&name, Some(family)),
            None => {
                let identified: Vec<CompilerInfo> = self
                    .prober
                    .identify_family(&path)
                    .iter()
                    .flat_map(|f| kb.find_info(&name, Some(f.as_ref())))
                    .collect();
                if identified.is_empty() {
                    kb.find_info(&name, None)
                } else {
                    identified
                }
            }
        };
        if let Some(role) = role {
            infos.retain(|i| i.role() == role);
        }

        match infos.len() {
            0 => Err(unknown_compiler(&path, role, family)),
            1 => self.get_or_create(&path, &infos[0]),
            _ => {
                let names: Vec<String> = infos.iter().map(CompilerInfo::short_descr).collect();
                warn!(
                    "'{}' could be any of: {}. Using {}",
                    path.display(),
                    names.join(", "),
                    names[0]
                );
                self.get_or_create(&path, &infos[0])
            }
        }
    }

    /// Number of distinct keys requested so far.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unknown_compiler(
    path: &Path,
    role: Option<CompilerRole>,
    family: Option<&CompilerFamily>,
) -> CfError {
    let mut message = format!("Unknown compiler '{}'", path.display());
    if let Some(role) = role {
        message.push_str(&format!(" for role {role}"));
    }
    if let Some(family) = family {
        message.push_str(&format!(" in {} family {}", family.kind(), family.name()));
    }
    CfError::configuration(message)
        .with_hint("Use a compiler command known to taucf, see `taucf families`")
}
