//! Subcommands and their shared argument groups.

use std::collections::BTreeMap;

use clap::{Args, Subcommand};
use taucf_core::compiler::builtin::{CC, CXX, FC, MPI_CC, MPI_CXX, MPI_FC};
use taucf_runtime::ToolchainRequest;

#[derive(Subcommand)]
pub enum Commands {
    /// List compiler roles
    Roles,

    /// List known compiler families
    Families {
        /// List MPI families instead of host families
        #[arg(long)]
        mpi: bool,
    },

    /// Identify one compiler command and show what it wraps
    Probe {
        /// Command name or path
        command: String,
        /// Role keyword the command must fill (e.g. CC, MPI_CXX)
        #[arg(long)]
        role: Option<String>,
        /// Family the command must belong to
        #[arg(long)]
        family: Option<String>,
    },

    /// Find the installed members of a compiler family
    Scan {
        /// Family name (e.g. GNU, Intel, System)
        family: String,
        /// Scan an MPI family
        #[arg(long)]
        mpi: bool,
    },

    /// Assemble a compiler set and print it
    Toolchain {
        #[command(flatten)]
        compilers: CompilerArgs,
    },

    /// Install and inspect external dependencies
    #[command(subcommand)]
    Package(PackageCommand),
}

#[derive(Subcommand)]
pub enum PackageCommand {
    /// Build and install a package unless already installed
    Install {
        #[command(flatten)]
        target: PackageArgs,
        /// Rebuild even when a valid installation exists
        #[arg(long)]
        force: bool,
    },

    /// Check that a package installation is complete
    Verify {
        #[command(flatten)]
        target: PackageArgs,
    },

    /// Show installation state and manifest
    Status {
        #[command(flatten)]
        target: PackageArgs,
    },

    /// Remove a package installation
    Uninstall {
        #[command(flatten)]
        target: PackageArgs,
    },

    /// Print the environment needed to use a package
    Env {
        #[command(flatten)]
        target: PackageArgs,
        /// Print the run-time environment instead of the compile-time one
        #[arg(long)]
        runtime: bool,
    },
}

/// Selects one package configuration.
#[derive(Args)]
pub struct PackageArgs {
    /// Package name (binutils, libunwind)
    pub package: String,

    /// "download", a URL, or a path to an archive or source directory
    #[arg(long, default_value = "download")]
    pub source: String,

    #[command(flatten)]
    pub compilers: CompilerArgs,
}

/// Compiler selection shared by every command that assembles a toolchain.
#[derive(Args, Default)]
pub struct CompilerArgs {
    /// Host compiler family
    #[arg(long = "host-compilers")]
    pub host_compilers: Option<String>,
    /// MPI compiler family
    #[arg(long = "mpi-compilers")]
    pub mpi_compilers: Option<String>,
    /// C compiler
    #[arg(long)]
    pub cc: Option<String>,
    /// C++ compiler
    #[arg(long)]
    pub cxx: Option<String>,
    /// Fortran compiler
    #[arg(long)]
    pub fc: Option<String>,
    /// MPI C compiler
    #[arg(long = "mpi-cc")]
    pub mpi_cc: Option<String>,
    /// MPI C++ compiler
    #[arg(long = "mpi-cxx")]
    pub mpi_cxx: Option<String>,
    /// MPI Fortran compiler
    #[arg(long = "mpi-fc")]
    pub mpi_fc: Option<String>,
}

impl CompilerArgs {
    pub fn to_request(&self) -> ToolchainRequest {
        let overrides: BTreeMap<_, _> = [
            (CC, &self.cc),
            (CXX, &self.cxx),
            (FC, &self.fc),
            (MPI_CC, &self.mpi_cc),
            (MPI_CXX, &self.mpi_cxx),
            (MPI_FC, &self.mpi_fc),
        ]
        .into_iter()
        .filter_map(|(role, cmd)| cmd.clone().map(|c| (role, c)))
        .collect();
        ToolchainRequest {
            host_family: self.host_compilers.clone(),
            mpi_family: self.mpi_compilers.clone(),
            overrides,
        }
    }
}
