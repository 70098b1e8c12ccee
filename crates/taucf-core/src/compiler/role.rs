//! Compiler roles.

use std::fmt;

/// A build responsibility a compiler fills (C, C++, Fortran, MPI variants).
///
/// Roles are plain values registered once in the
/// [`KnowledgeBase`](super::KnowledgeBase). Ordering follows the keyword so
/// that maps keyed by role iterate in a canonical, deterministic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompilerRole {
    keyword: &'static str,
    language: &'static str,
    required: bool,
}

impl CompilerRole {
    /// Define a new role.
    pub const fn new(keyword: &'static str, language: &'static str, required: bool) -> Self {
        Self {
            keyword,
            language,
            required,
        }
    }

    /// Configuration keyword, e.g. `CC` or `MPI_FC`.
    pub const fn keyword(&self) -> &'static str {
        self.keyword
    }

    /// Human language label, e.g. "C++".
    pub const fn language(&self) -> &'static str {
        self.language
    }

    /// Whether the measurement tool itself needs this role to build.
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

impl fmt::Display for CompilerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.keyword, self.language)
    }
}
