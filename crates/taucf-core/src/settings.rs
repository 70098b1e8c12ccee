//! Runtime settings.
//!
//! Resolution order for every field: explicit value, then environment
//! variable, then built-in default.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::error::{CfError, CfResult};

/// Install root override.
pub const ENV_HOME: &str = "TAUCF_HOME";
/// Subprocess timeout in seconds. Unset or `0` means no timeout.
pub const ENV_PROCESS_TIMEOUT: &str = "TAUCF_PROCESS_TIMEOUT_SECS";
/// Parallel jobs passed to `make`.
pub const ENV_BUILD_JOBS: &str = "TAUCF_BUILD_JOBS";

/// Values given explicitly, e.g. on the command line.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub install_root: Option<PathBuf>,
    pub process_timeout: Option<Duration>,
    pub build_jobs: Option<usize>,
}

/// Effective settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Packages install below `<install_root>/packages`, sources are staged
    /// below `<install_root>/src`.
    pub install_root: PathBuf,
    pub process_timeout: Option<Duration>,
    pub build_jobs: usize,
}

impl Settings {
    /// Resolve against the process environment.
    pub fn resolve(overrides: SettingsOverrides) -> CfResult<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    pub fn resolve_with<F>(overrides: SettingsOverrides, lookup: F) -> CfResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let install_root = match overrides.install_root {
            Some(root) => root,
            None => match lookup(ENV_HOME).filter(|v| !v.is_empty()) {
                Some(root) => PathBuf::from(root),
                None => default_install_root()?,
            },
        };

        let process_timeout = match overrides.process_timeout {
            Some(timeout) => Some(timeout),
            None => match lookup(ENV_PROCESS_TIMEOUT) {
                Some(raw) => {
                    let secs = parse_number::<u64>(ENV_PROCESS_TIMEOUT, &raw)?;
                    (secs > 0).then(|| Duration::from_secs(secs))
                }
                None => None,
            },
        };

        let build_jobs = match overrides.build_jobs {
            Some(jobs) => jobs,
            None => match lookup(ENV_BUILD_JOBS) {
                Some(raw) => parse_number::<usize>(ENV_BUILD_JOBS, &raw)?,
                None => num_cpus::get(),
            },
        }
        .max(1);

        debug!(
            install_root = %install_root.display(),
            ?process_timeout,
            build_jobs,
            "resolved settings"
        );
        Ok(Self {
            install_root,
            process_timeout,
            build_jobs,
        })
    }
}

fn default_install_root() -> CfResult<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("taucf"))
        .ok_or_else(|| {
            CfError::configuration("Cannot determine a data directory for taucf")
                .with_hint(format!("Set {ENV_HOME} to choose an install root"))
        })
}

fn parse_number<T: std::str::FromStr>(var: &str, raw: &str) -> CfResult<T> {
    raw.trim().parse().map_err(|_| {
        CfError::configuration(format!("Invalid value for {var}: '{raw}'"))
            .with_hint("Expected a non-negative integer")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_environment_values_apply() {
        let settings = Settings::resolve_with(
            SettingsOverrides::default(),
            lookup(&[
                (ENV_HOME, "/scratch/taucf"),
                (ENV_PROCESS_TIMEOUT, "30"),
                (ENV_BUILD_JOBS, "8"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.install_root, PathBuf::from("/scratch/taucf"));
        assert_eq!(settings.process_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.build_jobs, 8);
    }

    #[test]
    fn test_explicit_values_win() {
        let settings = Settings::resolve_with(
            SettingsOverrides {
                install_root: Some("/explicit".into()),
                process_timeout: None,
                build_jobs: Some(2),
            },
            lookup(&[(ENV_HOME, "/env"), (ENV_BUILD_JOBS, "16")]),
        )
        .unwrap();
        assert_eq!(settings.install_root, PathBuf::from("/explicit"));
        assert_eq!(settings.build_jobs, 2);
        assert_eq!(settings.process_timeout, None);
    }

    #[test]
    fn test_zero_timeout_disables_and_bad_numbers_fail() {
        let settings = Settings::resolve_with(
            SettingsOverrides {
                install_root: Some("/x".into()),
                ..SettingsOverrides::default()
            },
            lookup(&[(ENV_PROCESS_TIMEOUT, "0"), (ENV_BUILD_JOBS, "0")]),
        )
        .unwrap();
        assert_eq!(settings.process_timeout, None);
        assert_eq!(settings.build_jobs, 1);

        let err = Settings::resolve_with(
            SettingsOverrides {
                install_root: Some("/x".into()),
                ..SettingsOverrides::default()
            },
            lookup(&[(ENV_BUILD_JOBS, "many")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains(ENV_BUILD_JOBS));
    }
}
