//! Knowledge-base entries describing one compiler command.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::{CompilerFamily, CompilerRole};

/// One (family, role, command) triple drawn from the knowledge base.
///
/// Purely descriptive: a `CompilerInfo` says nothing about whether the
/// command is installed.
#[derive(Debug, Clone)]
pub struct CompilerInfo {
    family: Arc<CompilerFamily>,
    role: CompilerRole,
    command: String,
}

impl CompilerInfo {
    pub fn new(family: Arc<CompilerFamily>, role: CompilerRole, command: impl Into<String>) -> Self {
        Self {
            family,
            role,
            command: command.into(),
        }
    }

    pub fn family(&self) -> &Arc<CompilerFamily> {
        &self.family
    }

    pub const fn role(&self) -> CompilerRole {
        self.role
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Short human description, e.g. "GNU C++ compiler".
    pub fn short_descr(&self) -> String {
        format!("{} {} compiler", self.family.name(), self.role.language())
    }
}

impl PartialEq for CompilerInfo {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family && self.role == other.role && self.command == other.command
    }
}

impl Eq for CompilerInfo {}

impl Hash for CompilerInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.role.hash(state);
        self.command.hash(state);
    }
}

impl fmt::Display for CompilerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.command, self.short_descr())
    }
}
