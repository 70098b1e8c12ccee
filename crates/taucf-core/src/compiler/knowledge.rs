//! The compiler knowledge base.
//!
//! A static, read-only registry mapping compiler roles and families to the
//! command names that realize them. It is built once at startup (usually
//! via [`KnowledgeBase::builtin`]) and then shared by reference; nothing
//! mutates it afterwards, so concurrent lookups need no locking.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{CompilerFamily, CompilerInfo, CompilerRole, FamilyKind};
use crate::error::{CfError, CfResult};

/// Registry of known compiler roles and families.
#[derive(Debug, Default, Clone)]
pub struct KnowledgeBase {
    roles: Vec<CompilerRole>,
    families: Vec<Arc<CompilerFamily>>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a role. Registering an identical role twice is a no-op.
    pub fn register_role(&mut self, role: CompilerRole) -> CfResult<()> {
        match self.roles.iter().find(|r| r.keyword() == role.keyword()) {
            Some(existing) if *existing == role => Ok(()),
            Some(existing) => Err(CfError::internal(format!(
                "role {} registered twice with different definitions ({existing} vs {role})",
                role.keyword()
            ))),
            None => {
                self.roles.push(role);
                Ok(())
            }
        }
    }

    /// Register a family. Every role it uses must already be registered and
    /// `(kind, name)` must be unique.
    pub fn register_family(&mut self, family: CompilerFamily) -> CfResult<Arc<CompilerFamily>> {
        if self.families.iter().any(|f| **f == family) {
            return Err(CfError::internal(format!(
                "{} family '{}' registered twice",
                family.kind(),
                family.name()
            )));
        }
        for (role, _) in family.members() {
            if !self.roles.contains(role) {
                return Err(CfError::internal(format!(
                    "family '{}' uses unregistered role {}",
                    family.name(),
                    role.keyword()
                )));
            }
        }
        let family = Arc::new(family);
        self.families.push(Arc::clone(&family));
        Ok(family)
    }

    /// Look up a family by kind and name.
    pub fn find_family(&self, kind: FamilyKind, name: &str) -> CfResult<Arc<CompilerFamily>> {
        self.families
            .iter()
            .find(|f| f.kind() == kind && f.name() == name)
            .cloned()
            .ok_or_else(|| {
                CfError::configuration(format!("Invalid {kind} compiler family: {name}"))
                    .with_hint(format!(
                        "Valid {kind} compiler families are: {}",
                        self.family_names(kind).join(", ")
                    ))
            })
    }

    /// Registered families, optionally restricted to one kind, in
    /// registration order.
    pub fn families(&self, kind: Option<FamilyKind>) -> impl Iterator<Item = &Arc<CompilerFamily>> {
        self.families
            .iter()
            .filter(move |f| kind.is_none_or(|k| f.kind() == k))
    }

    /// Find every knowledge-base entry for `command`, optionally narrowed to
    /// one family.
    ///
    /// Zero, one, or several matches are all normal outcomes; callers decide
    /// how to treat ambiguity.
    pub fn find_info(&self, command: &str, family: Option<&CompilerFamily>) -> Vec<CompilerInfo> {
        self.families
            .iter()
            .filter(|f| family.is_none_or(|wanted| ***f == *wanted))
            .flat_map(|f| {
                f.members().iter().filter_map(move |(role, aliases)| {
                    aliases
                        .iter()
                        .any(|a| a == command)
                        .then(|| CompilerInfo::new(Arc::clone(f), *role, command))
                })
            })
            .collect()
    }

    /// Look up a registered role by keyword.
    ///
    /// An unknown keyword means a caller passed a role that never came from
    /// this knowledge base, which is an internal error.
    pub fn find_role(&self, keyword: &str) -> CfResult<CompilerRole> {
        self.roles
            .iter()
            .copied()
            .find(|r| r.keyword() == keyword)
            .ok_or_else(|| CfError::internal(format!("Invalid compiler role: {keyword}")))
    }

    /// All registered roles in registration order.
    pub fn roles(&self) -> &[CompilerRole] {
        &self.roles
    }

    /// Whether `role` is registered here.
    pub fn has_role(&self, role: CompilerRole) -> bool {
        self.roles.contains(&role)
    }

    /// Roles the measurement tool needs to build.
    pub fn required_roles(&self) -> BTreeSet<CompilerRole> {
        self.roles.iter().copied().filter(|r| r.is_required()).collect()
    }

    /// Role keywords, for command-line option validation.
    pub fn role_keywords(&self) -> Vec<&'static str> {
        self.roles.iter().map(CompilerRole::keyword).collect()
    }

    /// Family names of one kind, for command-line choice validation.
    pub fn family_names(&self, kind: FamilyKind) -> Vec<&str> {
        self.families(Some(kind)).map(|f| f.name()).collect()
    }
}
