//! Process execution port.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::CfResult;

/// One external command invocation: program, arguments, working directory
/// and extra environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessCommand {
    pub argv: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Set on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Removed from the inherited environment before `env` is applied.
    pub env_remove: BTreeSet<String>,
}

impl ProcessCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            argv: vec![program.into()],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.argv.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    #[must_use]
    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        self.env_remove.insert(key.into());
        self
    }

    #[must_use]
    pub fn env_removes<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_remove.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }
}

/// Shell-like rendering of the command line, for messages.
impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.argv.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, "'{arg}'")?;
            } else {
                f.write_str(arg)?;
            }
        }
        Ok(())
    }
}

/// Exit status and captured output of one finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Standard output and standard error, interleaved as text.
    pub output: String,
}

impl ProcessOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            output: output.into(),
        }
    }

    pub fn failure(code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            output: output.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Runs external commands to completion.
///
/// A non-zero exit is reported through [`ProcessOutput::exit_code`], not as
/// an error; callers decide what a failure means. `Err` is reserved for
/// commands that could not be launched or did not finish.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait ProcessExecutor: Send + Sync {
    fn run(&self, command: &ProcessCommand) -> CfResult<ProcessOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_and_display() {
        let cmd = ProcessCommand::new("./configure")
            .arg("--prefix=/opt/x")
            .args(["CFLAGS=-fPIC -O2"])
            .current_dir("/tmp/src")
            .env("CC", "gcc");
        assert_eq!(cmd.program(), "./configure");
        assert_eq!(cmd.to_string(), "./configure --prefix=/opt/x 'CFLAGS=-fPIC -O2'");
        assert_eq!(cmd.env.get("CC").map(String::as_str), Some("gcc"));
        assert_eq!(cmd.cwd.as_deref(), Some(Path::new("/tmp/src")));
    }

    #[test]
    fn test_mock_executor_sees_argv() {
        let mut mock = MockProcessExecutor::new();
        mock.expect_run()
            .withf(|cmd| cmd.argv == ["mpicc", "-show"])
            .times(1)
            .returning(|_| Ok(ProcessOutput::success("gcc -lmpi")));
        let out = mock
            .run(&ProcessCommand::new("mpicc").arg("-show"))
            .unwrap();
        assert!(out.is_success());
        assert_eq!(out.output, "gcc -lmpi");
    }
}
