//! CLI entry point: the composition root.
//!
//! Parses arguments, installs the tracing subscriber, bootstraps the
//! context and dispatches to handlers. Errors are mapped to sysexits-style
//! exit codes.

use std::process::ExitCode;

use clap::Parser;
use taucf_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = bootstrap(CliConfig::from_cli(cli))?;
    match &cli.command {
        Commands::Roles => handlers::compiler::roles(&ctx),
        Commands::Families { mpi } => handlers::compiler::families(&ctx, *mpi),
        Commands::Probe {
            command,
            role,
            family,
        } => handlers::compiler::probe(&ctx, command, role.as_deref(), family.as_deref())?,
        Commands::Scan { family, mpi } => handlers::compiler::scan(&ctx, family, *mpi)?,
        Commands::Toolchain { compilers } => handlers::compiler::toolchain(&ctx, compilers)?,
        Commands::Package(command) => handlers::package::execute(&ctx, command)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let err = CliError::from_anyhow(&err);
            eprintln!("Error: {err}");
            if let Some(hint) = err.hint() {
                eprintln!("Hint: {hint}");
            }
            ExitCode::from(err.exit_code())
        }
    }
}
