//! GNU binutils, which provides BFD for symbol resolution.

use std::fs;
use std::path::{Path, PathBuf};

use taucf_core::compiler::builtin::{CC, CXX, GNU, PGI};
use taucf_core::{CfError, CfResult, InstallLayout, TargetArch, TargetOs};
use tracing::debug;

use super::env::EnvContribution;
use super::recipe::{
    Artifact, ConfigureArgs, ConfigureContext, FamilySubstitution, PackageRecipe,
};
use super::source::copy_dir_recursive;

const SOURCES: &[(Option<TargetArch>, &str)] = &[(
    None,
    "http://www.cs.uoregon.edu/research/paracomp/tau/tauprofile/dist/binutils-2.23.2.tar.gz",
)];

const BGP_BIN: &str = "/bgsys/drivers/ppcfloor/gnu-linux/bin";
const KNC_AR: &str = "x86_64-k1om-linux-ar";
const BFD_GUARD: &str = "#if !defined PACKAGE && !defined PACKAGE_VERSION";
// Unset for every build step; configure chooses its own compilers.
const CLEARED_VARS: [&str; 6] = ["CPP", "CC", "CXX", "FC", "F77", "F90"];

#[derive(Debug, Clone)]
pub struct BinutilsRecipe {
    /// Directory searched for `linux-k1om-*` cross toolchains.
    knc_toolchain_root: PathBuf,
}

impl Default for BinutilsRecipe {
    fn default() -> Self {
        Self {
            knc_toolchain_root: PathBuf::from("/usr"),
        }
    }
}

impl BinutilsRecipe {
    pub fn with_knc_toolchain_root(root: impl Into<PathBuf>) -> Self {
        Self {
            knc_toolchain_root: root.into(),
        }
    }

    fn find_knc_ar(&self, ctx: &ConfigureContext<'_>) -> CfResult<PathBuf> {
        if let Some(ar) = ctx.resolver.which(KNC_AR) {
            return Ok(ar);
        }
        let mut candidates: Vec<PathBuf> = fs::read_dir(&self.knc_toolchain_root)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.file_name().to_string_lossy().starts_with("linux-k1om-"))
                    .map(|e| e.path().join("bin").join(KNC_AR))
                    .collect()
            })
            .unwrap_or_default();
        candidates.sort();
        candidates
            .iter()
            .find_map(|c| ctx.resolver.which(&c.to_string_lossy()))
            .ok_or_else(|| {
                CfError::configuration(format!(
                    "Cannot find KNC native compilers in {}/linux-k1om-*",
                    self.knc_toolchain_root.display()
                ))
            })
    }
}

impl PackageRecipe for BinutilsRecipe {
    fn name(&self) -> &'static str {
        "binutils"
    }

    fn title(&self) -> &'static str {
        "GNU Binutils"
    }

    fn default_sources(&self) -> &'static [(Option<TargetArch>, &'static str)] {
        SOURCES
    }

    fn artifacts(&self) -> Vec<Artifact> {
        vec![Artifact::file("lib/libbfd.a"), Artifact::file("include/bfd.h")]
    }

    fn substitution(&self) -> Option<FamilySubstitution> {
        Some(FamilySubstitution {
            incompatible: PGI,
            substitute: GNU,
            roles: &[CC, CXX],
        })
    }

    fn configure_args(&self, ctx: &ConfigureContext<'_>) -> CfResult<ConfigureArgs> {
        let mut args = ConfigureArgs::default();
        args.flags.extend(["--disable-nls".into(), "--disable-werror".into()]);
        args.env_remove = CLEARED_VARS.iter().map(|v| (*v).to_string()).collect();

        let cflags = if ctx.os == TargetOs::Darwin {
            "-Wno-error=unused-value -Wno-error=deprecated-declarations -fPIC"
        } else {
            "-fPIC"
        };
        args.flags.push(format!("CFLAGS={cflags}"));
        args.flags.push(format!("CXXFLAGS={cflags}"));

        match ctx.arch {
            TargetArch::IbmBgp => {
                args.flags.push(format!("CC={BGP_BIN}/powerpc-bgp-linux-gcc"));
                args.flags.push(format!("CXX={BGP_BIN}/powerpc-bgp-linux-g++"));
            }
            TargetArch::IbmBgq => {
                args.flags.push(format!("CC={BGP_BIN}/powerpc64-bgq-linux-gcc"));
                args.flags.push(format!("CXX={BGP_BIN}/powerpc64-bgq-linux-g++"));
            }
            TargetArch::Ibm64 => args.flags.push("--disable-largefile".into()),
            TargetArch::IntelKnc => {
                let ar = self.find_knc_ar(ctx)?;
                if let Some(dir) = ar.parent() {
                    args.path_prepend.push(dir.to_path_buf());
                }
                args.flags.push("--host=x86_64-k1om-linux".into());
            }
            _ => {}
        }
        Ok(args)
    }

    fn post_install(&self, ctx: &ConfigureContext<'_>) -> CfResult<()> {
        let src = ctx.source_dir;
        let include_dir = &ctx.layout.include_dir;
        let lib_dir = &ctx.layout.lib_dir;
        fs::create_dir_all(include_dir).map_err(|e| CfError::io(include_dir, e))?;
        fs::create_dir_all(lib_dir).map_err(|e| CfError::io(lib_dir, e))?;

        debug!("Copying missing BFD headers");
        for header in list_dir(&src.join("bfd"))? {
            if header.extension().is_some_and(|ext| ext == "h") {
                copy_into(&header, include_dir)?;
            }
        }
        for entry in list_dir(&src.join("include"))? {
            if entry.is_dir() {
                let target = include_dir.join(entry.file_name().unwrap_or_default());
                copy_dir_recursive(&entry, &target).map_err(|e| CfError::io(&target, e))?;
            } else {
                copy_into(&entry, include_dir)?;
            }
        }

        debug!("Copying missing libiberty libraries");
        copy_into(&src.join("libiberty").join("libiberty.a"), lib_dir)?;
        copy_into(&src.join("opcodes").join("libopcodes.a"), lib_dir)?;

        debug!("Fixing BFD header");
        let bfd_h = include_dir.join("bfd.h");
        let text = fs::read_to_string(&bfd_h).map_err(|e| CfError::io(&bfd_h, e))?;
        fs::write(&bfd_h, text.replace(BFD_GUARD, "#if 0")).map_err(|e| CfError::io(&bfd_h, e))
    }

    // bin/ stays out of PATH: the installed `ld` shadows the system linker.
    fn runtime_env(&self, layout: &InstallLayout, os: TargetOs) -> EnvContribution {
        EnvContribution {
            options: Vec::new(),
            prepend: vec![(os.library_path_var().to_string(), layout.lib_dir.clone())],
        }
    }
}

fn list_dir(dir: &Path) -> CfResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| CfError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry.map_err(|e| CfError::io(dir, e))?.path());
    }
    paths.sort();
    Ok(paths)
}

fn copy_into(file: &Path, dir: &Path) -> CfResult<()> {
    let target = dir.join(file.file_name().unwrap_or_default());
    fs::copy(file, &target).map_err(|e| CfError::io(file, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use taucf_core::compiler::builtin::FC;
    use taucf_core::ports::MockPathResolver;
    use taucf_core::{CompilerInfo, InstalledCompiler, InstalledCompilerSet, KnowledgeBase};
    use tempfile::TempDir;

    fn gnu_set(kb: &KnowledgeBase) -> InstalledCompilerSet {
        let gnu = kb.find_family(taucf_core::FamilyKind::Host, GNU).unwrap();
        let members = [(CC, "gcc"), (CXX, "g++"), (FC, "gfortran")].map(|(role, cmd)| {
            let info = CompilerInfo::new(Arc::clone(&gnu), role, cmd);
            let path = PathBuf::from("/usr/bin").join(cmd);
            (role, Arc::new(InstalledCompiler::new(path, info, None).unwrap()))
        });
        InstalledCompilerSet::new(kb, members).unwrap()
    }

    fn configure(
        recipe: &BinutilsRecipe,
        os: TargetOs,
        arch: TargetArch,
        resolver: &MockPathResolver,
    ) -> CfResult<ConfigureArgs> {
        let kb = KnowledgeBase::builtin().unwrap();
        let compilers = gnu_set(&kb);
        let layout = InstallLayout::new(Path::new("/opt/taucf"), "binutils", "abc");
        let ctx = ConfigureContext {
            os,
            arch,
            layout: &layout,
            compilers: &compilers,
            source_dir: Path::new("/opt/taucf/src/binutils-abc/binutils-2.23.2"),
            resolver,
        };
        recipe.configure_args(&ctx)
    }

    #[test]
    fn test_linux_x86_flags() {
        let resolver = MockPathResolver::new();
        let args = configure(
            &BinutilsRecipe::default(),
            TargetOs::Linux,
            TargetArch::X86_64,
            &resolver,
        )
        .unwrap();
        assert_eq!(
            args.flags,
            ["--disable-nls", "--disable-werror", "CFLAGS=-fPIC", "CXXFLAGS=-fPIC"]
        );
        assert!(args.path_prepend.is_empty());
        assert_eq!(args.env_remove, CLEARED_VARS);
    }

    #[test]
    fn test_darwin_and_ibm_targets() {
        let resolver = MockPathResolver::new();
        let darwin = configure(
            &BinutilsRecipe::default(),
            TargetOs::Darwin,
            TargetArch::X86_64,
            &resolver,
        )
        .unwrap();
        assert!(darwin.flags.iter().any(|f| f
            == "CFLAGS=-Wno-error=unused-value -Wno-error=deprecated-declarations -fPIC"));

        let bgq = configure(
            &BinutilsRecipe::default(),
            TargetOs::Linux,
            TargetArch::IbmBgq,
            &resolver,
        )
        .unwrap();
        assert!(bgq
            .flags
            .contains(&format!("CC={BGP_BIN}/powerpc64-bgq-linux-gcc")));

        let ibm64 = configure(
            &BinutilsRecipe::default(),
            TargetOs::Linux,
            TargetArch::Ibm64,
            &resolver,
        )
        .unwrap();
        assert_eq!(ibm64.flags.last().unwrap(), "--disable-largefile");
    }

    #[test]
    fn test_knc_finds_cross_archiver_below_toolchain_root() {
        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().join("linux-k1om-4.7").join("bin");
        fs::create_dir_all(&bin).unwrap();
        let ar = bin.join(KNC_AR);
        fs::write(&ar, "").unwrap();

        let mut resolver = MockPathResolver::new();
        resolver.expect_which().returning(|cmd| {
            let path = PathBuf::from(cmd);
            (path.is_absolute() && path.exists()).then_some(path)
        });
        let recipe = BinutilsRecipe::with_knc_toolchain_root(tmp.path());
        let args = configure(&recipe, TargetOs::Linux, TargetArch::IntelKnc, &resolver).unwrap();
        assert_eq!(args.path_prepend, [bin]);
        assert_eq!(args.flags.last().unwrap(), "--host=x86_64-k1om-linux");
        assert!(args.env_remove.iter().any(|v| v == "CC"));
        assert!(args.env.is_empty());
    }

    #[test]
    fn test_knc_without_cross_toolchain_is_configuration_error() {
        let tmp = TempDir::new().unwrap();
        let mut resolver = MockPathResolver::new();
        resolver.expect_which().returning(|_| None);
        let recipe = BinutilsRecipe::with_knc_toolchain_root(tmp.path());
        let err = configure(&recipe, TargetOs::Linux, TargetArch::IntelKnc, &resolver).unwrap_err();
        assert!(err.to_string().contains("Cannot find KNC native compilers"));
    }

    #[test]
    fn test_post_install_copies_headers_and_patches_bfd_h() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        for dir in ["bfd", "include/elf", "libiberty", "opcodes"] {
            fs::create_dir_all(src.join(dir)).unwrap();
        }
        fs::write(
            src.join("bfd/bfd.h"),
            format!("{BFD_GUARD}\n#error config.h must be included\n#endif\n"),
        )
        .unwrap();
        fs::write(src.join("bfd/bfd.c"), "").unwrap();
        fs::write(src.join("include/ansidecl.h"), "").unwrap();
        fs::write(src.join("include/elf/common.h"), "").unwrap();
        fs::write(src.join("libiberty/libiberty.a"), "").unwrap();
        fs::write(src.join("opcodes/libopcodes.a"), "").unwrap();

        let kb = KnowledgeBase::builtin().unwrap();
        let compilers = gnu_set(&kb);
        let layout = InstallLayout::new(&tmp.path().join("root"), "binutils", "abc");
        let resolver = MockPathResolver::new();
        let ctx = ConfigureContext {
            os: TargetOs::Linux,
            arch: TargetArch::X86_64,
            layout: &layout,
            compilers: &compilers,
            source_dir: &src,
            resolver: &resolver,
        };
        BinutilsRecipe::default().post_install(&ctx).unwrap();

        let bfd_h = fs::read_to_string(layout.include_dir.join("bfd.h")).unwrap();
        assert!(bfd_h.starts_with("#if 0\n"));
        assert!(!layout.include_dir.join("bfd.c").exists());
        assert!(layout.include_dir.join("ansidecl.h").exists());
        assert!(layout.include_dir.join("elf/common.h").exists());
        assert!(layout.lib_dir.join("libiberty.a").exists());
        assert!(layout.lib_dir.join("libopcodes.a").exists());
    }

    #[test]
    fn test_runtime_env_uses_loader_variable() {
        let layout = InstallLayout::new(Path::new("/opt/taucf"), "binutils", "abc");
        let recipe = BinutilsRecipe::default();
        let (_, env) = recipe
            .runtime_env(&layout, TargetOs::Darwin)
            .apply(&[], &BTreeMap::new());
        assert_eq!(env["DYLD_LIBRARY_PATH"], layout.lib_dir.display().to_string());
        assert_eq!(recipe.compiletime_env(&layout, TargetOs::Linux), EnvContribution::default());
    }
}
