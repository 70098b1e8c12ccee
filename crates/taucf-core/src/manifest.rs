//! Install manifest written into every successfully installed prefix.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CfError, CfResult};
use crate::host::{TargetArch, TargetOs};
use crate::package::SourceSpec;

/// File name of the manifest inside an install prefix.
pub const MANIFEST_FILE: &str = ".taucf-install.json";

/// Record of how an installation was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallManifest {
    pub package: String,
    pub source: SourceSpec,
    pub target_os: TargetOs,
    pub target_arch: TargetArch,
    /// UID of the compiler set the package was built with.
    pub compilers_uid: String,
    pub installation_uid: String,
    /// Configure arguments, in the order they were passed.
    pub configure_flags: Vec<String>,
    pub installed_at: DateTime<Utc>,
}

impl InstallManifest {
    pub fn path_in(prefix: &Path) -> PathBuf {
        prefix.join(MANIFEST_FILE)
    }

    /// Write the manifest into `prefix`.
    pub fn save(&self, prefix: &Path) -> CfResult<()> {
        let path = Self::path_in(prefix);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CfError::internal(format!("failed to serialize install manifest: {e}")))?;
        fs::write(&path, json).map_err(|e| CfError::io(&path, e))
    }

    /// Read the manifest from `prefix`. `Ok(None)` when there is none.
    pub fn load(prefix: &Path) -> CfResult<Option<Self>> {
        let path = Self::path_in(prefix);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CfError::io(&path, e)),
        };
        serde_json::from_str(&json).map(Some).map_err(|e| {
            CfError::configuration(format!("Corrupt install manifest {}: {e}", path.display()))
                .with_hint("Reinstall the package with --force")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_manifest_save_and_load() {
        let dir = tempdir().unwrap();
        let manifest = InstallManifest {
            package: "libunwind".into(),
            source: SourceSpec::Url("http://example.org/libunwind-1.1.tar.gz".into()),
            target_os: TargetOs::Linux,
            target_arch: TargetArch::X86_64,
            compilers_uid: "c0ffee".into(),
            installation_uid: "beef".into(),
            configure_flags: vec!["--prefix=/x".into(), "-GNU".into()],
            installed_at: Utc::now(),
        };
        manifest.save(dir.path()).unwrap();
        let loaded = InstallManifest::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_missing_manifest_is_none() {
        let dir = tempdir().unwrap();
        assert!(InstallManifest::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_manifest_is_configuration_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "{not json").unwrap();
        let err = InstallManifest::load(dir.path()).unwrap_err();
        assert!(err.hint().is_some());
    }
}
