//! Failures probing the outer compiler.

use taucf_core::CfError;
use thiserror::Error;

/// Why an outer compiler could not be probed.
///
/// Both cases make the command unusable; they convert into [`CfError`] so
/// callers that scan many aliases can decide to skip and continue.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The compiler could not be started or did not finish.
    #[error("could not run {compiler}: {source}")]
    Launch {
        compiler: String,
        #[source]
        source: CfError,
    },

    /// The compiler ran but rejected the wrapper-detection flags.
    #[error("`{command}` exited with status {}", code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    NonZeroExit {
        compiler: String,
        command: String,
        code: Option<i32>,
        output: String,
    },
}

impl From<ProbeError> for CfError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::Launch { source, .. } => source,
            ProbeError::NonZeroExit {
                compiler,
                command,
                output,
                ..
            } => Self::software_package(compiler, command, output),
        }
    }
}
