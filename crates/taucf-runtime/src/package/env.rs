//! Compile-time and run-time environment contributions.

use std::collections::BTreeMap;
use std::path::PathBuf;

#[cfg(windows)]
const PATH_SEP: char = ';';
#[cfg(not(windows))]
const PATH_SEP: char = ':';

/// What a package adds to a consumer's options and environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvContribution {
    /// Options appended to the consumer's option list.
    pub options: Vec<String>,
    /// Directories prepended to path-list variables, as `(variable, dir)`.
    pub prepend: Vec<(String, PathBuf)>,
}

impl EnvContribution {
    /// Apply to a snapshot of options and environment.
    ///
    /// Returns new collections: the option list with duplicates removed
    /// (first occurrence wins) and a copy of `env` with the contributed
    /// directories prepended.
    pub fn apply(
        &self,
        opts: &[String],
        env: &BTreeMap<String, String>,
    ) -> (Vec<String>, BTreeMap<String, String>) {
        let mut options: Vec<String> = Vec::with_capacity(opts.len() + self.options.len());
        for opt in opts.iter().chain(&self.options) {
            if !options.contains(opt) {
                options.push(opt.clone());
            }
        }
        let mut env = env.clone();
        for (var, dir) in &self.prepend {
            prepend_path(&mut env, var, &dir.display().to_string());
        }
        (options, env)
    }
}

fn prepend_path(env: &mut BTreeMap<String, String>, var: &str, dir: &str) {
    let value = match env.get(var) {
        Some(old) if old.split(PATH_SEP).any(|p| p == dir) => return,
        Some(old) if !old.is_empty() => format!("{dir}{PATH_SEP}{old}"),
        _ => dir.to_string(),
    };
    env.insert(var.to_string(), value);
}
