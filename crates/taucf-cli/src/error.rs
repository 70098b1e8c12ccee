//! CLI-specific error types and mappings.
//!
//! Maps `CfError` kinds to exit codes and user-facing messages.

use taucf_core::CfError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CliError {
    /// The environment or the input needs fixing.
    #[error("{message}")]
    Config {
        message: String,
        hint: Option<String>,
    },

    /// An external build or probe step failed.
    #[error("{0}")]
    Software(String),

    #[error("Invalid arguments: {0}")]
    Arguments(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("{0}")]
    Internal(String),
}

impl CliError {
    /// Exit code following sysexits.h where a category fits.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config { .. } => 78,  // EX_CONFIG
            Self::Software(_) => 70,    // EX_SOFTWARE
            Self::Arguments(_) => 2,    // EX_USAGE
            Self::Io(_) => 74,          // EX_IOERR
            Self::Internal(_) => 1,
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    /// Classify an error bubbling out of a handler.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(cli) = err.downcast_ref::<Self>() {
            return cli.clone();
        }
        if let Some(cf) = err.downcast_ref::<CfError>() {
            return cf.into();
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return Self::Io(io.to_string());
        }
        Self::Internal(format!("{err:#}"))
    }
}

impl From<&CfError> for CliError {
    fn from(err: &CfError) -> Self {
        match err {
            CfError::Configuration { message, hint } => Self::Config {
                message: message.clone(),
                hint: hint.clone(),
            },
            CfError::SoftwarePackage { .. } => Self::Software(err.to_string()),
            CfError::Internal(_) => Self::Internal(err.to_string()),
            CfError::Io { .. } => Self::Io(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_kind() {
        let config = CfError::configuration("bad").with_hint("fix it");
        let cli = CliError::from(&config);
        assert_eq!(cli.exit_code(), 78);
        assert_eq!(cli.hint(), Some("fix it"));

        let software = CfError::software_package("binutils", "make", "boom");
        assert_eq!(CliError::from(&software).exit_code(), 70);
        assert_eq!(CliError::from(&CfError::internal("x")).exit_code(), 1);
    }

    #[test]
    fn test_from_anyhow_finds_wrapped_core_error() {
        let err = anyhow::Error::from(CfError::configuration("no compilers"));
        let cli = CliError::from_anyhow(&err);
        assert_eq!(cli.exit_code(), 78);
        assert_eq!(cli.to_string(), "no compilers");

        let other = anyhow::anyhow!("surprise");
        assert_eq!(CliError::from_anyhow(&other).exit_code(), 1);
    }
}
