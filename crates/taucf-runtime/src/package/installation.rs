//! The generic install engine: verify, stage, configure, build, install,
//! re-verify, with cleanup on every exit path.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use taucf_core::compiler::builtin::HOST_ROLES;
use taucf_core::ports::{PathResolver, ProcessCommand, ProcessExecutor, SourceAcquirer};
use taucf_core::{
    CfError, CfResult, FamilyKind, InstallLayout, InstallManifest, InstalledCompilerFamily,
    InstalledCompilerSet, SourceSpec, TargetArch, TargetOs, installation_uid,
};
use tracing::{debug, info, warn};

use super::recipe::{ConfigureArgs, ConfigureContext, PackageRecipe};
use crate::progress::ProgressReporter;

/// Source of installed compiler families, used for family substitution.
pub trait FamilyProvider: Send + Sync {
    fn installed_family(&self, kind: FamilyKind, name: &str) -> CfResult<InstalledCompilerFamily>;
}

/// Collaborators the engine talks to.
#[derive(Clone)]
pub struct InstallServices {
    pub executor: Arc<dyn ProcessExecutor>,
    pub acquirer: Arc<dyn SourceAcquirer>,
    pub resolver: Arc<dyn PathResolver>,
    pub families: Arc<dyn FamilyProvider>,
    pub progress: Arc<dyn ProgressReporter>,
}

/// Parameters of one installation.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub source: SourceSpec,
    pub os: TargetOs,
    pub arch: TargetArch,
    pub install_root: PathBuf,
    pub build_jobs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Unverified,
    Verified,
    Installing,
    Failed,
}

/// Snapshot reported by [`Installation::status`].
#[derive(Debug, Clone)]
pub struct PackageStatus {
    pub package: String,
    pub prefix: PathBuf,
    /// `Ok` when the installation verifies, else why not.
    pub verified: Result<(), String>,
    pub manifest: Option<InstallManifest>,
}

const INSTALL_STEPS: u64 = 5;

/// One external dependency built against one compiler set.
pub struct Installation {
    recipe: Arc<dyn PackageRecipe>,
    source: SourceSpec,
    os: TargetOs,
    arch: TargetArch,
    compilers: InstalledCompilerSet,
    layout: InstallLayout,
    uid: String,
    build_jobs: usize,
    services: InstallServices,
    state: Cell<InstallState>,
}

impl Installation {
    /// Describe an installation. Nothing on disk is touched.
    ///
    /// A `download` source is replaced by the recipe's default location for
    /// the target architecture.
    pub fn new(
        recipe: Arc<dyn PackageRecipe>,
        request: InstallRequest,
        compilers: InstalledCompilerSet,
        services: InstallServices,
    ) -> CfResult<Self> {
        let source = request
            .source
            .resolve(recipe.name(), recipe.default_sources(), request.arch)?;
        let uid = installation_uid(
            recipe.name(),
            &source,
            request.os,
            request.arch,
            compilers.uid(),
        );
        let layout = InstallLayout::new(&request.install_root, recipe.name(), &uid);
        Ok(Self {
            recipe,
            source,
            os: request.os,
            arch: request.arch,
            compilers,
            layout,
            uid,
            build_jobs: request.build_jobs.max(1),
            services,
            state: Cell::new(InstallState::Unverified),
        })
    }

    pub fn name(&self) -> &'static str {
        self.recipe.name()
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub const fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub const fn source(&self) -> &SourceSpec {
        &self.source
    }

    pub const fn compilers(&self) -> &InstalledCompilerSet {
        &self.compilers
    }

    pub fn state(&self) -> InstallState {
        self.state.get()
    }

    /// Check that the prefix and every expected artifact exist.
    ///
    /// Never modifies the filesystem. The error names the first missing or
    /// non-executable path.
    pub fn verify(&self) -> CfResult<()> {
        let prefix = &self.layout.prefix;
        if !prefix.is_dir() {
            return Err(CfError::configuration(format!(
                "'{}' does not exist",
                prefix.display()
            )));
        }
        for artifact in self.recipe.artifacts() {
            let path = prefix.join(&artifact.path);
            if !path.exists() {
                return Err(CfError::configuration(format!("'{}' is missing", path.display())));
            }
            if artifact.executable && !is_executable(&path) {
                return Err(CfError::configuration(format!(
                    "'{}' exists but is not executable",
                    path.display()
                )));
            }
        }
        debug!("{} installation at '{}' is valid", self.name(), prefix.display());
        if self.state.get() != InstallState::Installing {
            self.state.set(InstallState::Verified);
        }
        Ok(())
    }

    /// Install unless already installed (or `force_reinstall`).
    pub fn install(&self, force_reinstall: bool) -> CfResult<()> {
        let title = self.recipe.title();
        if !force_reinstall {
            match self.verify() {
                Ok(()) => {
                    info!("{title} is already installed at '{}'", self.layout.prefix.display());
                    return Ok(());
                }
                Err(err) => debug!("{err}"),
            }
        }

        self.state.set(InstallState::Installing);
        let progress = &self.services.progress;
        if let Err(err) = self.run_install() {
            self.state.set(InstallState::Failed);
            progress.finish_with_error(&format!("{title} installation failed"));
            return Err(err);
        }

        self.state.set(InstallState::Unverified);
        match self.verify() {
            Ok(()) => {
                progress.finish(&format!("{title} installed"));
                info!("{title} installation complete");
                Ok(())
            }
            Err(err) => {
                self.state.set(InstallState::Failed);
                progress.finish_with_error(&format!("{title} installation is incomplete"));
                Err(err)
            }
        }
    }

    fn run_install(&self) -> CfResult<()> {
        let compilers = self.build_compilers()?;
        self.services
            .progress
            .start(&format!("Installing {}", self.recipe.title()), Some(INSTALL_STEPS));
        let result = self.stage_and_build(&compilers);
        self.remove_staging();
        result
    }

    /// The compiler set to build with, after family substitution.
    fn build_compilers(&self) -> CfResult<InstalledCompilerSet> {
        let Some(sub) = self.recipe.substitution() else {
            return Ok(self.compilers.clone());
        };
        let uses_incompatible = sub.roles.iter().any(|role| {
            self.compilers.get(*role).is_some_and(|c| {
                let family = c.innermost().family();
                family.kind() == FamilyKind::Host && family.name() == sub.incompatible
            })
        });
        if !uses_incompatible {
            return Ok(self.compilers.clone());
        }

        info!(
            "{} cannot be built with {} compilers, using {} compilers instead",
            self.recipe.title(),
            sub.incompatible,
            sub.substitute
        );
        let missing = || {
            CfError::configuration(format!(
                "{} compilers (required to build {}) could not be found",
                sub.substitute,
                self.recipe.title()
            ))
            .with_hint(format!("Install {} compilers or choose another source", sub.substitute))
        };
        let family = self
            .services
            .families
            .installed_family(FamilyKind::Host, sub.substitute)
            .map_err(|err| {
                debug!("{err}");
                missing()
            })?;
        let mut overrides = Vec::with_capacity(sub.roles.len());
        for role in sub.roles {
            let compiler = family.preferred(*role).map_err(|_| missing())?;
            overrides.push((*role, Arc::clone(compiler)));
        }
        Ok(self.compilers.modify(overrides))
    }

    fn stage_and_build(&self, compilers: &InstalledCompilerSet) -> CfResult<()> {
        let progress = &self.services.progress;
        let staging = &self.layout.staging_dir;

        progress.update(1, "Acquiring source");
        info!("Staging {} source from '{}'", self.name(), self.source);
        remove_dir_if_exists(staging)?;
        fs::create_dir_all(staging).map_err(|e| CfError::io(staging, e))?;
        let source_dir = self.services.acquirer.acquire(&self.source, staging)?;

        remove_dir_if_exists(&self.layout.prefix)?;
        let built = self.build(compilers, &source_dir);
        if built.is_err() {
            info!("{} installation failed, cleaning up", self.name());
            if let Err(err) = remove_dir_if_exists(&self.layout.prefix) {
                warn!("Cannot remove partial installation: {err}");
            }
        }
        built
    }

    fn build(&self, compilers: &InstalledCompilerSet, source_dir: &Path) -> CfResult<()> {
        let progress = &self.services.progress;
        let ctx = ConfigureContext {
            os: self.os,
            arch: self.arch,
            layout: &self.layout,
            compilers,
            source_dir,
            resolver: self.services.resolver.as_ref(),
        };
        let args = self.recipe.configure_args(&ctx)?;
        let env = self.step_env(compilers, &args);
        let step = |cmd: ProcessCommand| {
            cmd.current_dir(source_dir)
                .env_removes(args.env_remove.iter().cloned())
                .envs(&env)
        };

        let mut flags = vec![format!("--prefix={}", self.layout.prefix.display())];
        flags.extend(args.flags.iter().cloned());

        progress.update(2, "Configuring");
        self.run_step(&step(
            ProcessCommand::new(source_dir.join("configure").display().to_string())
                .args(flags.iter().cloned()),
        ))?;

        progress.update(3, "Compiling");
        self.run_step(&step(ProcessCommand::new("make").arg(format!("-j{}", self.build_jobs))))?;

        progress.update(4, "Installing");
        self.run_step(&step(ProcessCommand::new("make").arg("install")))?;

        progress.update(5, "Finishing installation");
        self.recipe.post_install(&ctx)?;
        fs::create_dir_all(&self.layout.prefix).map_err(|e| CfError::io(&self.layout.prefix, e))?;
        InstallManifest {
            package: self.name().to_string(),
            source: self.source.clone(),
            target_os: self.os,
            target_arch: self.arch,
            compilers_uid: compilers.uid().to_string(),
            installation_uid: self.uid.clone(),
            configure_flags: flags,
            installed_at: Utc::now(),
        }
        .save(&self.layout.prefix)
    }

    fn step_env(
        &self,
        compilers: &InstalledCompilerSet,
        args: &ConfigureArgs,
    ) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        for role in HOST_ROLES {
            if args.env_remove.iter().any(|var| var == role.keyword()) {
                continue;
            }
            if let Some(compiler) = compilers.get(role) {
                env.insert(
                    role.keyword().to_string(),
                    compiler.absolute_path().display().to_string(),
                );
            }
        }
        env.extend(args.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        if !args.path_prepend.is_empty() {
            let inherited = std::env::var_os("PATH").unwrap_or_default();
            let dirs = args
                .path_prepend
                .iter()
                .cloned()
                .chain(std::env::split_paths(&inherited));
            if let Ok(path) = std::env::join_paths(dirs) {
                env.insert("PATH".to_string(), path.to_string_lossy().into_owned());
            }
        }
        env
    }

    fn run_step(&self, cmd: &ProcessCommand) -> CfResult<()> {
        info!("{}", cmd);
        self.services.progress.message(&cmd.to_string());
        let output = self.services.executor.run(cmd)?;
        if output.is_success() {
            return Ok(());
        }
        Err(CfError::software_package(
            self.name(),
            cmd.to_string(),
            output.output,
        ))
    }

    fn remove_staging(&self) {
        debug!("Deleting '{}'", self.layout.staging_dir.display());
        if let Err(err) = remove_dir_if_exists(&self.layout.staging_dir) {
            warn!("Cannot remove staged sources: {err}");
        }
    }

    /// Options and environment making headers and libraries available to a
    /// build.
    pub fn compiletime_config(
        &self,
        opts: &[String],
        env: &BTreeMap<String, String>,
    ) -> (Vec<String>, BTreeMap<String, String>) {
        self.recipe.compiletime_env(&self.layout, self.os).apply(opts, env)
    }

    /// Options and environment making libraries available at run time.
    pub fn runtime_config(
        &self,
        opts: &[String],
        env: &BTreeMap<String, String>,
    ) -> (Vec<String>, BTreeMap<String, String>) {
        self.recipe.runtime_env(&self.layout, self.os).apply(opts, env)
    }

    pub fn status(&self) -> CfResult<PackageStatus> {
        Ok(PackageStatus {
            package: self.name().to_string(),
            prefix: self.layout.prefix.clone(),
            verified: self.verify().map_err(|e| e.to_string()),
            manifest: InstallManifest::load(&self.layout.prefix)?,
        })
    }

    /// Remove the install prefix. Returns whether anything was removed.
    pub fn uninstall(&self) -> CfResult<bool> {
        let existed = self.layout.prefix.exists();
        remove_dir_if_exists(&self.layout.prefix)?;
        self.state.set(InstallState::Unverified);
        if existed {
            info!("Removed '{}'", self.layout.prefix.display());
        }
        Ok(existed)
    }
}

fn remove_dir_if_exists(path: &Path) -> CfResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CfError::io(path, e)),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
