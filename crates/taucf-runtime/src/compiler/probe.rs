//! Compiler probing: working out what an installed command really is.
//!
//! Non-wrapping compilers need no subprocess at all. For wrappers (MPI
//! launchers, Cray compiler drivers) the family's wrapper-detection flags
//! make the command print the underlying invocation, which is then parsed
//! into the wrapped compiler plus the arguments the wrapper injects.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use taucf_core::ports::{PathResolver, ProcessCommand, ProcessExecutor};
use taucf_core::{
    CfError, CfResult, CompilerFamily, CompilerInfo, FlagTables, InstalledCompiler,
    KnowledgeBase, WrapperFlags,
};
use tracing::{debug, warn};

use super::error::ProbeError;

/// Callback used to obtain the wrapped compiler, normally through the
/// identity cache so shared wrapped compilers are probed once.
pub type ResolveWrapped<'a> =
    dyn FnMut(&Path, &CompilerInfo) -> CfResult<Arc<InstalledCompiler>> + 'a;

type Identified = HashMap<PathBuf, Vec<Arc<CompilerFamily>>>;

/// Invokes compilers and interprets their output.
///
/// Family identification is memoized per path, shared between clones, so
/// a command's version banners are requested at most once per run.
#[derive(Clone)]
pub struct CompilerProber {
    kb: Arc<KnowledgeBase>,
    executor: Arc<dyn ProcessExecutor>,
    resolver: Arc<dyn PathResolver>,
    identified: Arc<Mutex<Identified>>,
}

impl CompilerProber {
    pub fn new(
        kb: Arc<KnowledgeBase>,
        executor: Arc<dyn ProcessExecutor>,
        resolver: Arc<dyn PathResolver>,
    ) -> Self {
        Self {
            kb,
            executor,
            resolver,
            identified: Arc::default(),
        }
    }

    pub fn knowledge_base(&self) -> &Arc<KnowledgeBase> {
        &self.kb
    }

    pub fn resolver(&self) -> &Arc<dyn PathResolver> {
        &self.resolver
    }

    /// Probe one command.
    ///
    /// Failing to run the command, or a non-zero exit, is an error. Failing
    /// to identify what a wrapper wraps is logged and yields a compiler with
    /// no wrapped compiler.
    pub fn probe(
        &self,
        absolute_path: &Path,
        info: &CompilerInfo,
        resolve_wrapped: &mut ResolveWrapped<'_>,
    ) -> CfResult<InstalledCompiler> {
        let family = info.family();
        if family.show_wrapper_flags().is_empty() {
            debug!(path = %absolute_path.display(), "{} does not wrap", info.short_descr());
            return InstalledCompiler::new(absolute_path.to_path_buf(), info.clone(), None);
        }

        let compiler = absolute_path.display().to_string();
        let cmd = ProcessCommand::new(&compiler).args(family.show_wrapper_flags());
        debug!(command = %cmd, "probing wrapper");
        let output = self
            .executor
            .run(&cmd)
            .map_err(|source| ProbeError::Launch {
                compiler: compiler.clone(),
                source,
            })?;
        if !output.is_success() {
            return Err(ProbeError::NonZeroExit {
                compiler,
                command: cmd.to_string(),
                code: output.exit_code,
                output: output.output,
            }
            .into());
        }

        let wrapped = self.find_wrapped(info, &output.output, resolve_wrapped)?;
        if wrapped.is_none() {
            warn!(
                "Unable to identify compiler wrapped by wrapper '{}'. \
                 Continuing without wrapper details; builds may fail later on.",
                absolute_path.display()
            );
        }
        InstalledCompiler::new(absolute_path.to_path_buf(), info.clone(), wrapped)
    }

    /// Walk the wrapper's output looking for the line that invokes the
    /// wrapped compiler.
    fn find_wrapped(
        &self,
        info: &CompilerInfo,
        output: &str,
        resolve_wrapped: &mut ResolveWrapped<'_>,
    ) -> CfResult<Option<(Arc<InstalledCompiler>, WrapperFlags)>> {
        for line in candidate_lines(output) {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let Some((first, rest)) = tokens.split_first() else {
                continue;
            };
            let Some(wrapped_path) = self.resolver.which(first) else {
                debug!("'{first}' is not a command, trying next line");
                continue;
            };
            let command = wrapped_path
                .file_name()
                .map_or_else(|| (*first).to_string(), |n| n.to_string_lossy().into_owned());

            let families = self.identify_family(&wrapped_path);
            let mut infos: Vec<CompilerInfo> = families
                .iter()
                .flat_map(|f| self.kb.find_info(&command, Some(f.as_ref())))
                .collect();
            if infos.is_empty() {
                warn!(
                    "Unknown compiler '{}' wrapped by '{}'",
                    wrapped_path.display(),
                    info.command()
                );
                continue;
            }
            if infos.len() > 1 {
                let candidates: Vec<String> = infos.iter().map(CompilerInfo::short_descr).collect();
                warn!(
                    "'{}' could be any of: {}. Using {}",
                    wrapped_path.display(),
                    candidates.join(", "),
                    candidates[0]
                );
            }
            let wrapped_info = infos.swap_remove(0);

            let flags = match parse_wrapper_args(rest, info.family().flag_tables()) {
                Ok(flags) => flags,
                Err(err) => {
                    warn!("Cannot parse arguments of wrapper '{}': {err}", info.command());
                    continue;
                }
            };

            match resolve_wrapped(&wrapped_path, &wrapped_info) {
                Ok(wrapped) => {
                    debug!(
                        wrapper = info.command(),
                        wrapped = %wrapped.absolute_path().display(),
                        "identified wrapped compiler"
                    );
                    return Ok(Some((wrapped, flags)));
                }
                Err(err) if err.is_recoverable() => {
                    warn!(
                        "Cannot probe '{}' wrapped by '{}': {err}",
                        wrapped_path.display(),
                        info.command()
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    /// Families `path` could belong to, best match first.
    ///
    /// Families with a version signature are tried first by running the
    /// command with the signature's version flags. If no signature matches,
    /// every family declaring the command's basename is returned, host
    /// families before MPI families.
    pub fn identify_family(&self, path: &Path) -> Vec<Arc<CompilerFamily>> {
        // Held across the version queries so concurrent callers wait for the
        // first result instead of repeating it.
        let mut identified = self
            .identified
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(families) = identified.get(path) {
            return families.clone();
        }
        let families = self.identify_uncached(path);
        identified.insert(path.to_path_buf(), families.clone());
        families
    }

    fn identify_uncached(&self, path: &Path) -> Vec<Arc<CompilerFamily>> {
        let mut banners: BTreeMap<Vec<String>, Option<String>> = BTreeMap::new();
        let mut matched = Vec::new();
        for family in self.kb.families(None) {
            let Some(signature) = family.signature() else {
                continue;
            };
            let banner = banners
                .entry(signature.version_flags.clone())
                .or_insert_with(|| self.version_banner(path, &signature.version_flags));
            let Some(banner) = banner else {
                continue;
            };
            match family.signature_matches(banner) {
                Ok(true) => matched.push(Arc::clone(family)),
                Ok(false) => {}
                Err(err) => warn!("{err}"),
            }
        }
        if !matched.is_empty() {
            debug!(path = %path.display(), families = ?family_names(&matched), "identified by signature");
            return matched;
        }

        let command = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut declared: Vec<Arc<CompilerFamily>> = self
            .kb
            .families(None)
            .filter(|f| f.declares(&command))
            .cloned()
            .collect();
        declared.sort_by_key(|f| f.kind());
        debug!(path = %path.display(), families = ?family_names(&declared), "identified by name");
        declared
    }

    fn version_banner(&self, path: &Path, flags: &[String]) -> Option<String> {
        let cmd = ProcessCommand::new(path.display().to_string()).args(flags.iter().cloned());
        match self.executor.run(&cmd) {
            Ok(out) if out.is_success() => Some(out.output),
            Ok(out) => {
                debug!(command = %cmd, code = ?out.exit_code, "version query failed");
                None
            }
            Err(err) => {
                debug!(command = %cmd, "version query failed: {err}");
                None
            }
        }
    }
}

fn family_names(families: &[Arc<CompilerFamily>]) -> Vec<&str> {
    families.iter().map(|f| f.name()).collect()
}

/// Non-empty lines of `output`, longest first. Equal lengths keep their
/// original order.
///
/// This is a heuristic: a wrapper that prints a banner longer than its real
/// invocation line, starting with a resolvable command, will be
/// misidentified.
pub fn candidate_lines(output: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    lines.sort_by_key(|l| Reverse(l.len()));
    lines
}

#[derive(Clone, Copy)]
enum FlagSlot {
    Include,
    LibraryPath,
    Library,
}

/// Split the arguments a wrapper passes to its wrapped compiler.
///
/// Tokens are consumed left to right. Include-path flags are tried first,
/// then library-path flags, then link-library flags. An exact flag takes
/// the next token as its value; a prefix takes the rest of the same token.
/// Everything else is an opaque compiler flag.
pub fn parse_wrapper_args(tokens: &[&str], tables: &FlagTables) -> CfResult<WrapperFlags> {
    let slots = [
        (FlagSlot::Include, &tables.include_path),
        (FlagSlot::LibraryPath, &tables.library_path),
        (FlagSlot::Library, &tables.link_library),
    ];
    let mut flags = WrapperFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let mut matched = None;
        'tables: for (slot, table) in &slots {
            for flag in table.iter() {
                if token == flag.as_str() {
                    let value = tokens.get(i + 1).ok_or_else(|| {
                        CfError::configuration(format!("'{flag}' is missing its value"))
                    })?;
                    matched = Some((*slot, (*value).to_string(), 2));
                    break 'tables;
                }
                if let Some(value) = token.strip_prefix(flag.as_str()) {
                    if !value.is_empty() {
                        matched = Some((*slot, value.to_string(), 1));
                        break 'tables;
                    }
                }
            }
        }
        match matched {
            Some((slot, value, consumed)) => {
                match slot {
                    FlagSlot::Include => flags.include_path.push(value),
                    FlagSlot::LibraryPath => flags.library_path.push(value),
                    FlagSlot::Library => flags.libraries.push(value),
                }
                i += consumed;
            }
            None => {
                flags.compiler_flags.push(token.to_string());
                i += 1;
            }
        }
    }
    Ok(flags)
}
