//! CLI bootstrap: the composition root.
//!
//! The only place where concrete adapters are instantiated: the subprocess
//! executor, the search path, and the toolchain that owns the per-run
//! compiler cache. Handlers receive the composed [`CliContext`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use taucf_core::ports::{PathResolver, ProcessExecutor};
use taucf_core::{HostEnvironment, KnowledgeBase, Settings, SettingsOverrides};
use taucf_runtime::{SearchPath, SystemProcessExecutor, Toolchain};
use tracing::debug;

use crate::parser::Cli;

/// Bootstrap configuration taken from global command-line options.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub overrides: SettingsOverrides,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            overrides: SettingsOverrides {
                install_root: cli.install_root.clone(),
                process_timeout: cli.timeout.map(Duration::from_secs),
                build_jobs: cli.jobs,
            },
        }
    }
}

/// Fully composed context for command handlers.
pub struct CliContext {
    pub settings: Settings,
    pub executor: Arc<dyn ProcessExecutor>,
    pub resolver: Arc<dyn PathResolver>,
    pub toolchain: Arc<Toolchain>,
}

impl CliContext {
    pub fn knowledge_base(&self) -> &KnowledgeBase {
        self.toolchain.knowledge_base()
    }

    pub fn host(&self) -> &HostEnvironment {
        self.toolchain.host()
    }
}

pub fn bootstrap(config: CliConfig) -> Result<CliContext> {
    let settings = Settings::resolve(config.overrides)?;
    let host = HostEnvironment::detect();
    debug!(os = %host.os, arch = %host.arch, "detected host");

    let executor: Arc<dyn ProcessExecutor> =
        Arc::new(SystemProcessExecutor::new().with_timeout(settings.process_timeout));
    let resolver: Arc<dyn PathResolver> = Arc::new(SearchPath::system());
    let kb = Arc::new(KnowledgeBase::builtin()?);
    let toolchain = Arc::new(Toolchain::new(
        kb,
        host,
        Arc::clone(&executor),
        Arc::clone(&resolver),
    ));

    Ok(CliContext {
        settings,
        executor,
        resolver,
        toolchain,
    })
}
