//! Error types shared by every taucf component.
//!
//! Callers distinguish three kinds of failure through [`CfError::kind`]:
//!
//! - **Configuration**: the environment or the input is wrong in a way the
//!   user can fix (missing artifact, unusable command, unreachable source,
//!   unmet mandatory compiler role).
//! - **Software package**: an external build step exited non-zero. The
//!   failing command line and its captured output are carried verbatim.
//! - **Internal**: the core violated one of its own invariants.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Coarse classification of a [`CfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// User-fixable environment or input problem.
    Configuration,
    /// An external process exited with a failure status.
    SoftwarePackage,
    /// Defect in taucf itself.
    Internal,
}

/// Errors produced by compiler resolution and package installation.
#[derive(Debug, Error)]
pub enum CfError {
    /// The environment or the input is wrong in a user-fixable way.
    #[error("{message}")]
    Configuration {
        message: String,
        /// Suggested remedy, shown below the message by front ends.
        hint: Option<String>,
    },

    /// An external command exited non-zero (or could not finish).
    #[error("{package}: `{command}` failed\n{output}")]
    SoftwarePackage {
        package: String,
        command: String,
        output: String,
    },

    /// An invariant was violated inside taucf.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Filesystem or process IO failed.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CfError {
    /// Create a `Configuration` error without a hint.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a remedy hint. Only `Configuration` errors carry hints.
    #[must_use]
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        match self {
            Self::Configuration { message, .. } => Self::Configuration {
                message,
                hint: Some(hint.into()),
            },
            other => other,
        }
    }

    /// Create a `SoftwarePackage` error for a failed external command.
    pub fn software_package(
        package: impl Into<String>,
        command: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::SoftwarePackage {
            package: package.into(),
            command: command.into(),
            output: output.into(),
        }
    }

    /// Create an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wrap an IO error together with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } | Self::Io { .. } => ErrorKind::Configuration,
            Self::SoftwarePackage { .. } => ErrorKind::SoftwarePackage,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The remedy hint, if any.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Configuration { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    /// Whether the caller may reasonably skip the failing item and continue.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Internal)
    }
}

/// Result type alias for taucf operations.
pub type CfResult<T> = Result<T, CfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_only_attaches_to_configuration() {
        let err = CfError::configuration("C compiler could not be found")
            .with_hint("Pass --cc explicitly");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.hint(), Some("Pass --cc explicitly"));

        let err = CfError::internal("bad role").with_hint("ignored");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.hint().is_none());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_software_package_message_carries_output() {
        let err = CfError::software_package("binutils", "make -j4", "ld: cannot find -lz");
        assert_eq!(err.kind(), ErrorKind::SoftwarePackage);
        let msg = err.to_string();
        assert!(msg.contains("make -j4"));
        assert!(msg.contains("ld: cannot find -lz"));
    }

    #[test]
    fn test_io_errors_classify_as_configuration() {
        let err = CfError::io(
            "/nonexistent",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("/nonexistent"));
    }
}
