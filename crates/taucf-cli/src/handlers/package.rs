//! Handlers for `taucf package ...`.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use taucf_core::SourceSpec;
use taucf_runtime::{
    ArchiveAcquirer, InstallRequest, InstallServices, Installation, find_recipe,
};
use tracing::info;

use crate::bootstrap::CliContext;
use crate::commands::{PackageArgs, PackageCommand};
use crate::progress::CliProgress;

pub fn execute(ctx: &CliContext, command: &PackageCommand) -> Result<()> {
    match command {
        PackageCommand::Install { target, force } => {
            let inst = installation(ctx, target)?;
            inst.install(*force)?;
            println!("{} installed at {}", inst.name(), inst.layout().prefix.display());
        }
        PackageCommand::Verify { target } => {
            let inst = installation(ctx, target)?;
            inst.verify()?;
            println!("{} at {} is valid", inst.name(), inst.layout().prefix.display());
        }
        PackageCommand::Status { target } => status(&installation(ctx, target)?)?,
        PackageCommand::Uninstall { target } => {
            let inst = installation(ctx, target)?;
            if inst.uninstall()? {
                println!("Removed {}", inst.layout().prefix.display());
            } else {
                println!("{} is not installed", inst.name());
            }
        }
        PackageCommand::Env { target, runtime } => {
            let inst = installation(ctx, target)?;
            let env: BTreeMap<String, String> = std::env::vars().collect();
            let (opts, new_env) = if *runtime {
                inst.runtime_config(&[], &env)
            } else {
                inst.compiletime_config(&[], &env)
            };
            if !opts.is_empty() {
                println!("# options: {}", opts.join(" "));
            }
            for (key, value) in &new_env {
                if env.get(key) != Some(value) {
                    println!("export {key}=\"{value}\"");
                }
            }
        }
    }
    Ok(())
}

fn installation(ctx: &CliContext, args: &PackageArgs) -> Result<Installation> {
    let recipe = find_recipe(&args.package)?;
    let source: SourceSpec = args.source.parse()?;
    let compilers = ctx.toolchain.assemble(&args.compilers.to_request())?;
    let host = ctx.host();
    let services = InstallServices {
        executor: Arc::clone(&ctx.executor),
        acquirer: Arc::new(ArchiveAcquirer::new()),
        resolver: Arc::clone(&ctx.resolver),
        families: ctx.toolchain.clone(),
        progress: Arc::new(CliProgress::new()),
    };
    let request = InstallRequest {
        source,
        os: host.os,
        arch: host.arch,
        install_root: ctx.settings.install_root.clone(),
        build_jobs: ctx.settings.build_jobs,
    };
    let inst = Installation::new(recipe, request, compilers, services)?;
    info!(uid = inst.uid(), prefix = %inst.layout().prefix.display(), "{}", inst.name());
    Ok(inst)
}

fn status(inst: &Installation) -> Result<()> {
    let status = inst.status()?;
    println!("package  {}", status.package);
    println!("prefix   {}", status.prefix.display());
    match &status.verified {
        Ok(()) => println!("state    installed"),
        Err(reason) => println!("state    not installed ({reason})"),
    }
    if let Some(manifest) = status.manifest {
        println!("source   {}", manifest.source);
        println!("target   {} {}", manifest.target_os, manifest.target_arch);
        println!("date     {}", manifest.installed_at.to_rfc3339());
        println!("flags    {}", manifest.configure_flags.join(" "));
    }
    Ok(())
}
