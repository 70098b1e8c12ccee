//! Compiler families: vendor/toolchain groupings of compiler commands.

use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;

use super::CompilerRole;
use crate::error::{CfError, CfResult};

/// Which registry a family belongs to.
///
/// Host and MPI families are kept apart so that the same vendor name
/// ("Intel", "Cray") can exist once per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FamilyKind {
    /// Plain host compilers (C, C++, Fortran).
    Host,
    /// MPI wrapper compilers.
    Mpi,
}

impl fmt::Display for FamilyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Mpi => write!(f, "MPI"),
        }
    }
}

/// Flag prefixes used to recognize arguments a wrapper injects.
///
/// Each entry matches either exactly (the value is the following token) or
/// as a prefix (the value is the rest of the same token).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagTables {
    pub include_path: Vec<String>,
    pub library_path: Vec<String>,
    pub link_library: Vec<String>,
}

impl Default for FlagTables {
    fn default() -> Self {
        Self {
            include_path: vec!["-I".to_string()],
            library_path: vec!["-L".to_string()],
            link_library: vec!["-l".to_string()],
        }
    }
}

/// How to recognize a family from a command's version banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilySignature {
    /// Flags that make the compiler print its version banner.
    pub version_flags: Vec<String>,
    /// Regular expression matched against the banner.
    pub pattern: String,
}

/// A named group of compilers sharing vendor conventions.
///
/// Identity is `(kind, name)`; everything else is descriptive.
#[derive(Debug, Clone)]
pub struct CompilerFamily {
    name: String,
    kind: FamilyKind,
    members: Vec<(CompilerRole, Vec<String>)>,
    show_wrapper_flags: Vec<String>,
    flags: FlagTables,
    signature: Option<FamilySignature>,
}

impl CompilerFamily {
    /// Create an empty host family.
    pub fn new(name: impl Into<String>, kind: FamilyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            members: Vec::new(),
            show_wrapper_flags: Vec::new(),
            flags: FlagTables::default(),
            signature: None,
        }
    }

    /// Create an MPI family. MPI wrappers reveal what they wrap with `-show`
    /// unless told otherwise.
    pub fn mpi(name: impl Into<String>) -> Self {
        Self::new(name, FamilyKind::Mpi).with_wrapper_flags(&["-show"])
    }

    /// Declare the commands filling `role`, in preference order.
    ///
    /// Calling this twice for the same role appends to the alias list.
    #[must_use]
    pub fn with_members(mut self, role: CompilerRole, commands: &[&str]) -> Self {
        let commands = commands.iter().map(|c| (*c).to_string());
        if let Some((_, aliases)) = self.members.iter_mut().find(|(r, _)| *r == role) {
            aliases.extend(commands);
        } else {
            self.members.push((role, commands.collect()));
        }
        self
    }

    /// Replace the flags used to ask a wrapper what it wraps.
    #[must_use]
    pub fn with_wrapper_flags(mut self, flags: &[&str]) -> Self {
        self.show_wrapper_flags = flags.iter().map(|f| (*f).to_string()).collect();
        self
    }

    /// Replace the injected-argument flag tables.
    #[must_use]
    pub fn with_flag_tables(mut self, flags: FlagTables) -> Self {
        self.flags = flags;
        self
    }

    /// Declare a version-banner signature for identification.
    #[must_use]
    pub fn with_signature(mut self, version_flags: &[&str], pattern: &str) -> Self {
        self.signature = Some(FamilySignature {
            version_flags: version_flags.iter().map(|f| (*f).to_string()).collect(),
            pattern: pattern.to_string(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> FamilyKind {
        self.kind
    }

    /// Roles and their aliases, in declaration order.
    pub fn members(&self) -> &[(CompilerRole, Vec<String>)] {
        &self.members
    }

    /// Aliases for one role, or an empty slice.
    pub fn aliases(&self, role: CompilerRole) -> &[String] {
        self.members
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, aliases)| aliases.as_slice())
            .unwrap_or_default()
    }

    /// Whether any role of this family declares `command`.
    pub fn declares(&self, command: &str) -> bool {
        self.members
            .iter()
            .any(|(_, aliases)| aliases.iter().any(|a| a == command))
    }

    /// Flags that make a wrapper print the command it wraps. Empty when the
    /// family's compilers are not wrappers.
    pub fn show_wrapper_flags(&self) -> &[String] {
        &self.show_wrapper_flags
    }

    pub const fn flag_tables(&self) -> &FlagTables {
        &self.flags
    }

    pub const fn signature(&self) -> Option<&FamilySignature> {
        self.signature.as_ref()
    }

    /// Test a version banner against this family's signature.
    ///
    /// Families without a signature never match.
    pub fn signature_matches(&self, banner: &str) -> CfResult<bool> {
        let Some(signature) = &self.signature else {
            return Ok(false);
        };
        let re = Regex::new(&signature.pattern).map_err(|e| {
            CfError::internal(format!(
                "invalid signature pattern for {} family: {e}",
                self.name
            ))
        })?;
        Ok(re.is_match(banner))
    }
}

impl PartialEq for CompilerFamily {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

impl Eq for CompilerFamily {}

impl Hash for CompilerFamily {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CC: CompilerRole = CompilerRole::new("CC", "C", true);
    const CXX: CompilerRole = CompilerRole::new("CXX", "C++", true);

    #[test]
    fn test_members_keep_declaration_order() {
        let family = CompilerFamily::new("GNU", FamilyKind::Host)
            .with_members(CC, &["gcc"])
            .with_members(CXX, &["g++", "c++"])
            .with_members(CXX, &["gxx"]);

        assert_eq!(family.aliases(CXX), ["g++", "c++", "gxx"]);
        assert_eq!(family.members()[0].0, CC);
        assert!(family.declares("c++"));
        assert!(!family.declares("icc"));
    }

    #[test]
    fn test_mpi_family_defaults_to_show() {
        let family = CompilerFamily::mpi("System");
        assert_eq!(family.kind(), FamilyKind::Mpi);
        assert_eq!(family.show_wrapper_flags(), ["-show"]);

        let cray = CompilerFamily::mpi("Cray").with_wrapper_flags(&["-craype-verbose"]);
        assert_eq!(cray.show_wrapper_flags(), ["-craype-verbose"]);
    }

    #[test]
    fn test_identity_is_kind_and_name() {
        let host = CompilerFamily::new("Intel", FamilyKind::Host).with_members(CC, &["icc"]);
        let mpi = CompilerFamily::mpi("Intel");
        assert_ne!(host, mpi);
        assert_eq!(host, CompilerFamily::new("Intel", FamilyKind::Host));
    }

    #[test]
    fn test_signature_matching() {
        let gnu = CompilerFamily::new("GNU", FamilyKind::Host)
            .with_signature(&["--version"], r"Free Software Foundation");
        assert!(
            gnu.signature_matches("gcc (GCC) 13.2.0\nCopyright (C) 2023 Free Software Foundation, Inc.")
                .unwrap()
        );
        assert!(!gnu.signature_matches("clang version 17.0.0").unwrap());

        let unsigned = CompilerFamily::new("Other", FamilyKind::Host);
        assert!(!unsigned.signature_matches("anything").unwrap());

        let broken = CompilerFamily::new("Broken", FamilyKind::Host).with_signature(&[], "(");
        assert!(broken.signature_matches("x").is_err());
    }
}
