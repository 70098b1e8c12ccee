//! Root CLI structure and global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Compiler discovery and dependency installation for performance tooling.
#[derive(Parser)]
#[command(name = "taucf")]
#[command(about = "Identify compilers and build measurement dependencies")]
#[command(version)]
pub struct Cli {
    /// Install root for packages and staged sources
    #[arg(long = "install-root", global = true)]
    pub install_root: Option<PathBuf>,

    /// Parallel build jobs
    #[arg(short = 'j', long = "jobs", global = true)]
    pub jobs: Option<usize>,

    /// Kill external commands running longer than this many seconds
    #[arg(long = "timeout", global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["taucf", "roles", "-v", "--install-root", "/tmp/taucf", "-j", "8"]);
        assert!(cli.verbose);
        assert_eq!(cli.install_root, Some(PathBuf::from("/tmp/taucf")));
        assert_eq!(cli.jobs, Some(8));
        assert!(matches!(cli.command, Commands::Roles));
    }
}
