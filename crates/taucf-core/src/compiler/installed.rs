//! Installed compilers, installed families, and complete compiler sets.
//!
//! These are the results of probing. Construction is pure: the runtime
//! crate does the probing and hands the facts in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::uid::UidHasher;
use super::{CompilerFamily, CompilerInfo, CompilerRole, KnowledgeBase};
use crate::error::{CfError, CfResult};

/// Arguments a wrapper compiler injects on every invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperFlags {
    pub include_path: Vec<String>,
    pub library_path: Vec<String>,
    pub compiler_flags: Vec<String>,
    pub libraries: Vec<String>,
}

impl WrapperFlags {
    pub fn is_empty(&self) -> bool {
        self.include_path.is_empty()
            && self.library_path.is_empty()
            && self.compiler_flags.is_empty()
            && self.libraries.is_empty()
    }

    /// Append entries from `other` that are not present yet, keeping first
    /// occurrence order.
    pub fn merge(&mut self, other: &Self) {
        fn extend_unique(dst: &mut Vec<String>, src: &[String]) {
            for value in src {
                if !dst.contains(value) {
                    dst.push(value.clone());
                }
            }
        }
        extend_unique(&mut self.include_path, &other.include_path);
        extend_unique(&mut self.library_path, &other.library_path);
        extend_unique(&mut self.compiler_flags, &other.compiler_flags);
        extend_unique(&mut self.libraries, &other.libraries);
    }
}

/// A real, executable compiler command found on disk.
///
/// Instances are immutable once built. The runtime's identity cache owns the
/// canonical `Arc` per `(path, info)` so that reference equality can be used
/// to ask "is this the compiler X was built with".
#[derive(Debug)]
pub struct InstalledCompiler {
    absolute_path: PathBuf,
    info: CompilerInfo,
    command: String,
    path: PathBuf,
    uid: String,
    wrapped: Option<Arc<InstalledCompiler>>,
    flags: WrapperFlags,
}

impl InstalledCompiler {
    /// Build an installed compiler from probe results.
    ///
    /// `wrapped` carries the compiler behind a wrapper together with the
    /// arguments the wrapper injects. Non-wrapping compilers and wrappers
    /// whose internals could not be identified pass `None`.
    pub fn new(
        absolute_path: PathBuf,
        info: CompilerInfo,
        wrapped: Option<(Arc<Self>, WrapperFlags)>,
    ) -> CfResult<Self> {
        if !absolute_path.is_absolute() {
            return Err(CfError::internal(format!(
                "installed compiler path is not absolute: {}",
                absolute_path.display()
            )));
        }
        let command = absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CfError::internal(format!(
                    "installed compiler path has no file name: {}",
                    absolute_path.display()
                ))
            })?;
        let path = absolute_path
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);
        let (wrapped, flags) = match wrapped {
            Some((compiler, flags)) => (Some(compiler), flags),
            None => (None, WrapperFlags::default()),
        };
        let uid = compute_uid(&absolute_path, &info, wrapped.as_deref(), &flags);
        Ok(Self {
            absolute_path,
            info,
            command,
            path,
            uid,
            wrapped,
            flags,
        })
    }

    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    pub const fn info(&self) -> &CompilerInfo {
        &self.info
    }

    pub fn family(&self) -> &Arc<CompilerFamily> {
        self.info.family()
    }

    pub const fn role(&self) -> CompilerRole {
        self.info.role()
    }

    /// Command name without directory.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Directory containing the command.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// The compiler this one wraps, if known.
    pub const fn wrapped(&self) -> Option<&Arc<Self>> {
        self.wrapped.as_ref()
    }

    pub const fn wrapper_flags(&self) -> &WrapperFlags {
        &self.flags
    }

    pub fn include_path(&self) -> &[String] {
        &self.flags.include_path
    }

    pub fn library_path(&self) -> &[String] {
        &self.flags.library_path
    }

    pub fn compiler_flags(&self) -> &[String] {
        &self.flags.compiler_flags
    }

    pub fn libraries(&self) -> &[String] {
        &self.flags.libraries
    }

    /// Follow the wrapped chain to the innermost compiler.
    pub fn innermost(&self) -> &Self {
        let mut current = self;
        while let Some(inner) = &current.wrapped {
            current = inner;
        }
        current
    }
}

/// UID: path, family name, role keyword, then (for wrappers) the wrapped
/// UID and each list of injected arguments in parsed order.
fn compute_uid(
    absolute_path: &Path,
    info: &CompilerInfo,
    wrapped: Option<&InstalledCompiler>,
    flags: &WrapperFlags,
) -> String {
    let mut hasher = UidHasher::new();
    hasher
        .field(absolute_path.to_string_lossy().as_bytes())
        .field(info.family().name())
        .field(info.role().keyword());
    if let Some(wrapped) = wrapped {
        hasher
            .field(wrapped.uid())
            .list("include_path", &flags.include_path)
            .list("library_path", &flags.library_path)
            .list("compiler_flags", &flags.compiler_flags)
            .list("libraries", &flags.libraries);
    }
    hasher.finish()
}

/// The members of one family actually present on this machine.
///
/// Rebuilt from scratch by every scan. Per role, index 0 is the family's
/// preferred compiler.
#[derive(Debug, Clone)]
pub struct InstalledCompilerFamily {
    family: Arc<CompilerFamily>,
    members: BTreeMap<CompilerRole, Vec<Arc<InstalledCompiler>>>,
}

impl InstalledCompilerFamily {
    pub const fn new(family: Arc<CompilerFamily>) -> Self {
        Self {
            family,
            members: BTreeMap::new(),
        }
    }

    /// Record a compiler found for `role`, after any already recorded.
    pub fn add(&mut self, role: CompilerRole, compiler: Arc<InstalledCompiler>) {
        self.members.entry(role).or_default().push(compiler);
    }

    pub const fn family(&self) -> &Arc<CompilerFamily> {
        &self.family
    }

    /// Every compiler found for `role`, in preference order.
    pub fn members(&self, role: CompilerRole) -> &[Arc<InstalledCompiler>] {
        self.members.get(&role).map(Vec::as_slice).unwrap_or_default()
    }

    /// The preferred installed compiler for `role`.
    ///
    /// An error here means "this family is not usable for this role".
    pub fn preferred(&self, role: CompilerRole) -> CfResult<&Arc<InstalledCompiler>> {
        self.members(role).first().ok_or_else(|| {
            CfError::configuration(format!(
                "{} {} compiler could not be found",
                self.family.name(),
                role.language()
            ))
        })
    }

    /// One preferred compiler per filled role, in canonical role order.
    pub fn iter(&self) -> impl Iterator<Item = (CompilerRole, &Arc<InstalledCompiler>)> {
        self.members
            .iter()
            .filter_map(|(role, found)| found.first().map(|c| (*role, c)))
    }

    pub fn is_empty(&self) -> bool {
        self.members.values().all(Vec::is_empty)
    }
}

/// A completed toolchain: exactly one compiler per filled role.
#[derive(Debug, Clone)]
pub struct InstalledCompilerSet {
    uid: String,
    members: BTreeMap<CompilerRole, Arc<InstalledCompiler>>,
}

impl InstalledCompilerSet {
    /// Build a set, checking it against the knowledge base.
    ///
    /// Roles unknown to `kb` are an internal error. Every required role must
    /// be present; otherwise a configuration error lists all missing roles.
    pub fn new<I>(kb: &KnowledgeBase, members: I) -> CfResult<Self>
    where
        I: IntoIterator<Item = (CompilerRole, Arc<InstalledCompiler>)>,
    {
        let members: BTreeMap<_, _> = members.into_iter().collect();
        if let Some(role) = members.keys().find(|r| !kb.has_role(**r)) {
            return Err(CfError::internal(format!(
                "Invalid role: {}",
                role.keyword()
            )));
        }
        let missing: Vec<CompilerRole> = kb
            .required_roles()
            .into_iter()
            .filter(|r| !members.contains_key(r))
            .collect();
        if !missing.is_empty() {
            return Err(missing_roles_error(&missing));
        }
        Ok(Self::from_members(members))
    }

    fn from_members(members: BTreeMap<CompilerRole, Arc<InstalledCompiler>>) -> Self {
        let mut hasher = UidHasher::new();
        for (role, compiler) in &members {
            hasher
                .field(role.keyword())
                .field(compiler.absolute_path().to_string_lossy().as_bytes())
                .field(compiler.uid());
        }
        Self {
            uid: hasher.finish(),
            members,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn get(&self, role: CompilerRole) -> Option<&Arc<InstalledCompiler>> {
        self.members.get(&role)
    }

    /// The compiler filling `role`, or a configuration error.
    pub fn compiler(&self, role: CompilerRole) -> CfResult<&Arc<InstalledCompiler>> {
        self.get(role).ok_or_else(|| {
            CfError::configuration(format!("{} compiler could not be found", role.language()))
        })
    }

    /// Members in canonical role order.
    pub fn iter(&self) -> impl Iterator<Item = (CompilerRole, &Arc<InstalledCompiler>)> {
        self.members.iter().map(|(role, c)| (*role, c))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// A new set with some roles replaced or added. The UID is recomputed.
    #[must_use]
    pub fn modify<I>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (CompilerRole, Arc<InstalledCompiler>)>,
    {
        let mut members = self.members.clone();
        members.extend(overrides);
        Self::from_members(members)
    }

    /// Union of the arguments injected by the wrappers filling `roles`.
    pub fn wrapper_flags(&self, roles: &[CompilerRole]) -> WrapperFlags {
        let mut flags = WrapperFlags::default();
        for role in roles {
            if let Some(compiler) = self.members.get(role) {
                flags.merge(compiler.wrapper_flags());
            }
        }
        flags
    }
}

impl PartialEq for InstalledCompilerSet {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for InstalledCompilerSet {}

fn missing_roles_error(missing: &[CompilerRole]) -> CfError {
    let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
    CfError::configuration(format!(
        "Required compilers could not be found: {}",
        names.join(", ")
    ))
    .with_hint("Specify the missing compilers explicitly or select a different compiler family")
}
