//! Search-path resolution backed by the `which` crate.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use taucf_core::ports::PathResolver;

/// Resolves commands against `PATH`, or against a fixed directory list.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    /// `None` means the process `PATH` at lookup time.
    dirs: Option<OsString>,
}

impl SearchPath {
    /// Resolve against the process `PATH`.
    pub const fn system() -> Self {
        Self { dirs: None }
    }

    /// Resolve against exactly these directories.
    pub fn from_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let joined = std::env::join_paths(dirs.into_iter().map(|d| d.as_ref().to_path_buf()))
            .unwrap_or_default();
        Self { dirs: Some(joined) }
    }
}

impl PathResolver for SearchPath {
    fn which(&self, command: &str) -> Option<PathBuf> {
        if command.is_empty() {
            return None;
        }
        let cwd = std::env::current_dir().ok()?;
        let found = match &self.dirs {
            None => which::which(command),
            Some(dirs) => which::which_in(command, Some(dirs), &cwd),
        };
        found.ok().map(|p| if p.is_absolute() { p } else { cwd.join(p) })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn touch_exe(path: &Path, mode: u32) {
        fs::write(path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn test_finds_executables_in_listed_dirs() {
        let dir = tempfile::tempdir().unwrap();
        touch_exe(&dir.path().join("mpicc"), 0o755);
        touch_exe(&dir.path().join("notexec"), 0o644);

        let search = SearchPath::from_dirs([dir.path()]);
        assert_eq!(search.which("mpicc"), Some(dir.path().join("mpicc")));
        assert_eq!(search.which("notexec"), None);
        assert_eq!(search.which("gcc-does-not-exist"), None);
        assert_eq!(search.which(""), None);
    }

    #[test]
    fn test_paths_with_separators_are_checked_directly() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("icc");
        touch_exe(&exe, 0o755);

        let search = SearchPath::from_dirs(Vec::<PathBuf>::new());
        assert_eq!(search.which(exe.to_str().unwrap()), Some(exe));
    }
}
