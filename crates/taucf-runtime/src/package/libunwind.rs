//! libunwind, used for call-stack unwinding during sampling.

use taucf_core::compiler::builtin::{APPLE, CRAY, CXX, GNU, IBM, INTEL, LLVM, PGI};
use taucf_core::{CfResult, InstallLayout, TargetArch, TargetOs};
use tracing::warn;

use super::env::EnvContribution;
use super::recipe::{Artifact, ConfigureArgs, ConfigureContext, PackageRecipe};

const SOURCES: &[(Option<TargetArch>, &str)] = &[
    (
        None,
        "http://www.cs.uoregon.edu/research/paracomp/tau/tauprofile/dist/libunwind-1.1.tar.gz",
    ),
    (
        Some(TargetArch::X86_64),
        "http://www.cs.uoregon.edu/research/paracomp/tau/tauprofile/dist/libunwind-1.1.tar.gz",
    ),
];

#[derive(Debug, Default, Clone, Copy)]
pub struct LibunwindRecipe;

/// Position-independent code flag for a host compiler family.
fn pic_flag(family: &str) -> Option<&'static str> {
    match family {
        GNU | LLVM | APPLE | INTEL => Some("-fPIC"),
        PGI => Some("-fpic"),
        IBM => Some("-qpic"),
        CRAY => Some("-hPIC"),
        _ => None,
    }
}

impl PackageRecipe for LibunwindRecipe {
    fn name(&self) -> &'static str {
        "libunwind"
    }

    fn title(&self) -> &'static str {
        "libunwind"
    }

    fn default_sources(&self) -> &'static [(Option<TargetArch>, &'static str)] {
        SOURCES
    }

    fn artifacts(&self) -> Vec<Artifact> {
        vec![Artifact::file("lib/libunwind.a")]
    }

    fn configure_args(&self, ctx: &ConfigureContext<'_>) -> CfResult<ConfigureArgs> {
        let mut args = ConfigureArgs::default();
        let Some(cxx) = ctx.compilers.get(CXX) else {
            return Ok(args);
        };
        let family = cxx.innermost().family().name();
        match pic_flag(family) {
            Some(flag) => args.flags.push(format!("CFLAGS={flag}")),
            None => warn!("libunwind has no compiler flag for '{family}', using defaults"),
        }
        Ok(args)
    }

    fn compiletime_env(&self, layout: &InstallLayout, _os: TargetOs) -> EnvContribution {
        EnvContribution {
            options: vec![format!("-I{}", layout.include_dir.display())],
            prepend: Vec::new(),
        }
    }

    fn runtime_env(&self, layout: &InstallLayout, os: TargetOs) -> EnvContribution {
        EnvContribution {
            options: Vec::new(),
            prepend: vec![(os.library_path_var().to_string(), layout.lib_dir.clone())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use taucf_core::compiler::builtin::{CC, FC};
    use taucf_core::ports::MockPathResolver;
    use taucf_core::{
        CompilerInfo, FamilyKind, InstalledCompiler, InstalledCompilerSet, KnowledgeBase,
    };

    fn flags_for(family: &str) -> Vec<String> {
        let kb = KnowledgeBase::builtin().unwrap();
        let fam = kb.find_family(FamilyKind::Host, family).unwrap();
        let members = [CC, CXX, FC].map(|role| {
            let cmd = fam.aliases(role)[0].clone();
            let info = CompilerInfo::new(Arc::clone(&fam), role, cmd.clone());
            let path = PathBuf::from("/opt/cc/bin").join(cmd);
            (role, Arc::new(InstalledCompiler::new(path, info, None).unwrap()))
        });
        let compilers = InstalledCompilerSet::new(&kb, members).unwrap();
        let layout = InstallLayout::new(Path::new("/opt/taucf"), "libunwind", "abc");
        let resolver = MockPathResolver::new();
        let ctx = ConfigureContext {
            os: TargetOs::Linux,
            arch: TargetArch::X86_64,
            layout: &layout,
            compilers: &compilers,
            source_dir: Path::new("/tmp/libunwind-1.1"),
            resolver: &resolver,
        };
        LibunwindRecipe.configure_args(&ctx).unwrap().flags
    }

    #[test]
    fn test_family_specific_pic_flag() {
        assert_eq!(flags_for(GNU), ["CFLAGS=-fPIC"]);
        assert_eq!(flags_for(PGI), ["CFLAGS=-fpic"]);
        assert_eq!(flags_for(IBM), ["CFLAGS=-qpic"]);
    }

    #[test]
    fn test_compiletime_env_adds_include_dir() {
        let layout = InstallLayout::new(Path::new("/opt/taucf"), "libunwind", "abc");
        let (opts, _) = LibunwindRecipe
            .compiletime_env(&layout, TargetOs::Linux)
            .apply(&["-O2".to_string()], &Default::default());
        assert_eq!(opts, ["-O2".to_string(), format!("-I{}", layout.include_dir.display())]);
    }
}
