//! Package installation: the generic autotools engine, source acquisition,
//! and the built-in recipes.

mod binutils;
mod env;
mod installation;
mod libunwind;
mod recipe;
mod source;

use std::sync::Arc;

pub use binutils::BinutilsRecipe;
pub use env::EnvContribution;
pub use installation::{
    FamilyProvider, InstallRequest, InstallServices, InstallState, Installation, PackageStatus,
};
pub use libunwind::LibunwindRecipe;
pub use recipe::{Artifact, ConfigureArgs, ConfigureContext, FamilySubstitution, PackageRecipe};
pub use source::ArchiveAcquirer;

use taucf_core::{CfError, CfResult};

/// Every recipe shipped with taucf.
pub fn builtin_recipes() -> Vec<Arc<dyn PackageRecipe>> {
    vec![
        Arc::new(BinutilsRecipe::default()),
        Arc::new(LibunwindRecipe),
    ]
}

/// Look up a built-in recipe by name.
pub fn find_recipe(name: &str) -> CfResult<Arc<dyn PackageRecipe>> {
    let recipes = builtin_recipes();
    let known: Vec<&str> = recipes.iter().map(|r| r.name()).collect();
    let hint = format!("Known packages: {}", known.join(", "));
    recipes
        .into_iter()
        .find(|r| r.name() == name)
        .ok_or_else(|| CfError::configuration(format!("Unknown package '{name}'")).with_hint(hint))
}
