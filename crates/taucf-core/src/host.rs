//! Target and host description.
//!
//! [`HostEnvironment`] is an explicit value object handed to whatever needs
//! host defaults, instead of each component reading process state on its own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compiler::CompilerRole;
use crate::compiler::builtin::{
    APPLE, CC, CRAY, CXX, FC, GNU, MPI_CC, MPI_CXX, MPI_FC, SYSTEM_MPI,
};
use crate::error::CfError;

/// Operating systems that change how packages are configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetOs {
    Linux,
    Darwin,
    /// Cray Compute Node Linux.
    CrayCnl,
    Windows,
    Other,
}

impl TargetOs {
    /// The OS this binary was compiled for.
    pub fn host() -> Self {
        match std::env::consts::OS {
            "linux" => Self::Linux,
            "macos" => Self::Darwin,
            "windows" => Self::Windows,
            _ => Self::Other,
        }
    }

    /// Environment variable the dynamic loader searches for shared libraries.
    pub const fn library_path_var(self) -> &'static str {
        match self {
            Self::Darwin => "DYLD_LIBRARY_PATH",
            Self::Windows => "PATH",
            Self::Linux | Self::CrayCnl | Self::Other => "LD_LIBRARY_PATH",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "Linux",
            Self::Darwin => "Darwin",
            Self::CrayCnl => "CNL",
            Self::Windows => "Windows",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetOs {
    type Err = CfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "darwin" | "macos" => Ok(Self::Darwin),
            "cnl" | "craycnl" | "cray_cnl" => Ok(Self::CrayCnl),
            "windows" => Ok(Self::Windows),
            "other" => Ok(Self::Other),
            _ => Err(CfError::configuration(format!("Invalid operating system: {s}"))
                .with_hint("Valid values are: Linux, Darwin, CNL, Windows, Other")),
        }
    }
}

/// CPU architectures, including the cross-compiled ones packages care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetArch {
    X86_64,
    Aarch64,
    Ppc64le,
    /// Big-endian 64-bit POWER.
    Ibm64,
    /// IBM Blue Gene/P.
    IbmBgp,
    /// IBM Blue Gene/Q.
    IbmBgq,
    /// Intel Knights Corner coprocessor.
    IntelKnc,
    Other,
}

impl TargetArch {
    /// The architecture this binary was compiled for.
    pub fn host() -> Self {
        match std::env::consts::ARCH {
            "x86_64" => Self::X86_64,
            "aarch64" => Self::Aarch64,
            "powerpc64" if cfg!(target_endian = "little") => Self::Ppc64le,
            "powerpc64" => Self::Ibm64,
            _ => Self::Other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "arm64",
            Self::Ppc64le => "ppc64le",
            Self::Ibm64 => "ibm64",
            Self::IbmBgp => "bgp",
            Self::IbmBgq => "bgq",
            Self::IntelKnc => "mic_linux",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for TargetArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetArch {
    type Err = CfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "arm64" | "aarch64" => Ok(Self::Aarch64),
            "ppc64le" => Ok(Self::Ppc64le),
            "ibm64" | "ppc64" => Ok(Self::Ibm64),
            "bgp" => Ok(Self::IbmBgp),
            "bgq" => Ok(Self::IbmBgq),
            "mic_linux" | "knc" => Ok(Self::IntelKnc),
            "other" => Ok(Self::Other),
            _ => Err(CfError::configuration(format!("Invalid architecture: {s}")).with_hint(
                "Valid values are: x86_64, arm64, ppc64le, ibm64, bgp, bgq, mic_linux, other",
            )),
        }
    }
}

/// Host facts consumed by the compiler set assembler and package recipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    pub os: TargetOs,
    pub arch: TargetArch,
    /// Host family selected when the user names none.
    pub preferred_family: String,
    /// MPI family selected when the user names none.
    pub preferred_mpi_family: String,
    /// Last-resort command per role, as `(role keyword, command)`.
    pub default_commands: Vec<(&'static str, String)>,
}

impl HostEnvironment {
    /// Describe the machine this process runs on.
    pub fn detect() -> Self {
        Self::for_target(TargetOs::host(), TargetArch::host())
    }

    /// Host defaults for an explicit OS and architecture.
    pub fn for_target(os: TargetOs, arch: TargetArch) -> Self {
        let (family, mpi_family, commands): (&str, &str, [&str; 3]) = match os {
            TargetOs::CrayCnl => (CRAY, CRAY, ["cc", "CC", "ftn"]),
            TargetOs::Darwin => (APPLE, SYSTEM_MPI, ["clang", "clang++", "gfortran"]),
            _ => (GNU, SYSTEM_MPI, ["gcc", "g++", "gfortran"]),
        };
        let mpi_commands: [&str; 3] = if os == TargetOs::CrayCnl {
            ["cc", "CC", "ftn"]
        } else {
            ["mpicc", "mpicxx", "mpif90"]
        };
        let default_commands = [CC, CXX, FC]
            .into_iter()
            .zip(commands)
            .chain([MPI_CC, MPI_CXX, MPI_FC].into_iter().zip(mpi_commands))
            .map(|(role, cmd)| (role.keyword(), cmd.to_string()))
            .collect();
        Self {
            os,
            arch,
            preferred_family: family.to_string(),
            preferred_mpi_family: mpi_family.to_string(),
            default_commands,
        }
    }

    /// The fallback command for `role`, if the host declares one.
    pub fn default_command(&self, role: CompilerRole) -> Option<&str> {
        self.default_commands
            .iter()
            .find(|(keyword, _)| *keyword == role.keyword())
            .map(|(_, cmd)| cmd.as_str())
    }
}
