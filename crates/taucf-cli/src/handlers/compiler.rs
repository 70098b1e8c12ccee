//! Handlers for the compiler inspection commands.

use std::sync::Arc;

use anyhow::Result;
use taucf_core::{CfError, CfResult, CompilerFamily, FamilyKind, KnowledgeBase};

use crate::bootstrap::CliContext;
use crate::commands::CompilerArgs;
use crate::presentation::{describe_compiler, describe_family, describe_set, role_listing};

const fn kind(mpi: bool) -> FamilyKind {
    if mpi { FamilyKind::Mpi } else { FamilyKind::Host }
}

pub fn roles(ctx: &CliContext) {
    for line in role_listing(ctx.knowledge_base()) {
        println!("{line}");
    }
}

pub fn families(ctx: &CliContext, mpi: bool) {
    for name in ctx.knowledge_base().family_names(kind(mpi)) {
        println!("{name}");
    }
}

/// A family named on the command line. Host families take precedence over
/// MPI families of the same name.
fn named_family(kb: &KnowledgeBase, name: &str) -> CfResult<Arc<CompilerFamily>> {
    kb.find_family(FamilyKind::Host, name)
        .or_else(|_| kb.find_family(FamilyKind::Mpi, name))
        .map_err(|_| {
            CfError::configuration(format!("Unknown compiler family '{name}'"))
                .with_hint("Run `taucf families` or `taucf families --mpi` to list families")
        })
}

pub fn probe(
    ctx: &CliContext,
    command: &str,
    role: Option<&str>,
    family: Option<&str>,
) -> Result<()> {
    let kb = ctx.knowledge_base();
    let role = role.map(|r| kb.find_role(r)).transpose()?;
    let family = family.map(|f| named_family(kb, f)).transpose()?;
    let compiler = ctx.toolchain.resolve(command, role, family.as_deref())?;
    print!("{}", describe_compiler(&compiler));
    Ok(())
}

pub fn scan(ctx: &CliContext, family: &str, mpi: bool) -> Result<()> {
    let installed = ctx.toolchain.scan(kind(mpi), family)?;
    print!("{}", describe_family(&installed));
    Ok(())
}

pub fn toolchain(ctx: &CliContext, compilers: &CompilerArgs) -> Result<()> {
    let set = ctx.toolchain.assemble(&compilers.to_request())?;
    print!("{}", describe_set(&set));
    Ok(())
}
