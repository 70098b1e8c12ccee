//! Package sources and on-disk installation layout.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compiler::uid::UidHasher;
use crate::error::{CfError, CfResult};
use crate::host::{TargetArch, TargetOs};

/// Where a package's sources come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum SourceSpec {
    /// Use the package's default download location for the target.
    Download,
    /// Fetch an archive over the network.
    Url(String),
    /// An archive or an unpacked source directory on the local filesystem.
    Path(PathBuf),
}

impl SourceSpec {
    /// Replace the `download` sentinel with a concrete location from
    /// `defaults`.
    ///
    /// `defaults` maps an architecture to a URL; the `None` entry is used for
    /// any architecture without its own entry.
    pub fn resolve(
        &self,
        package: &str,
        defaults: &[(Option<TargetArch>, &str)],
        arch: TargetArch,
    ) -> CfResult<Self> {
        if !matches!(self, Self::Download) {
            return Ok(self.clone());
        }
        defaults
            .iter()
            .find(|(a, _)| *a == Some(arch))
            .or_else(|| defaults.iter().find(|(a, _)| a.is_none()))
            .map(|(_, url)| Self::Url((*url).to_string()))
            .ok_or_else(|| {
                CfError::configuration(format!(
                    "{package} has no default source for architecture {arch}"
                ))
                .with_hint("Specify a source URL or path explicitly")
            })
    }

    /// File name of the archive, used when staging a download.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Self::Download => None,
            Self::Url(url) => url
                .split(['?', '#'])
                .next()
                .and_then(|u| u.rsplit('/').next())
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            Self::Path(path) => path.file_name().map(|n| n.to_string_lossy().into_owned()),
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => f.write_str("download"),
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FromStr for SourceSpec {
    type Err = CfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CfError::configuration("Empty package source"));
        }
        if s.eq_ignore_ascii_case("download") {
            return Ok(Self::Download);
        }
        if ["http://", "https://", "ftp://"]
            .iter()
            .any(|scheme| s.starts_with(scheme))
        {
            return Ok(Self::Url(s.to_string()));
        }
        let path = s.strip_prefix("file://").unwrap_or(s);
        Ok(Self::Path(PathBuf::from(path)))
    }
}

/// Archive formats the source acquirer can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Tar,
    Zip,
}

impl ArchiveKind {
    /// Guess the archive format from a file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".tar") {
            Some(Self::Tar)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// Filesystem layout of one installation.
///
/// The prefix is exclusive to one installation: its path is derived from the
/// installation UID, so two different configurations never share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub prefix: PathBuf,
    pub include_dir: PathBuf,
    pub lib_dir: PathBuf,
    pub bin_dir: PathBuf,
    /// Scratch directory sources are unpacked into. Removed after every
    /// install attempt.
    pub staging_dir: PathBuf,
}

impl InstallLayout {
    /// Layout for `package` below the install root `root`.
    pub fn new(root: &Path, package: &str, installation_uid: &str) -> Self {
        let prefix = root.join("packages").join(package).join(installation_uid);
        Self {
            include_dir: prefix.join("include"),
            lib_dir: prefix.join("lib"),
            bin_dir: prefix.join("bin"),
            staging_dir: root.join("src").join(format!("{package}-{installation_uid}")),
            prefix,
        }
    }
}

/// Stable identifier of a package configuration.
///
/// Covers everything that changes the build output: package name, source,
/// target, and the compiler set built against.
pub fn installation_uid(
    package: &str,
    source: &SourceSpec,
    os: TargetOs,
    arch: TargetArch,
    compilers_uid: &str,
) -> String {
    let mut hasher = UidHasher::new();
    hasher
        .field(package)
        .field(source.to_string())
        .field(os.as_str())
        .field(arch.as_str())
        .field(compilers_uid);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: &[(Option<TargetArch>, &str)] = &[
        (None, "http://example.org/dist/pkg-1.0.tar.gz"),
        (Some(TargetArch::X86_64), "http://example.org/dist/pkg-1.1.tar.gz"),
    ];

    #[test]
    fn test_parse_source_specs() {
        assert_eq!("download".parse::<SourceSpec>().unwrap(), SourceSpec::Download);
        assert_eq!("DOWNLOAD".parse::<SourceSpec>().unwrap(), SourceSpec::Download);
        assert_eq!(
            "https://x.org/a.tgz".parse::<SourceSpec>().unwrap(),
            SourceSpec::Url("https://x.org/a.tgz".into())
        );
        assert_eq!(
            "file:///opt/src/pkg".parse::<SourceSpec>().unwrap(),
            SourceSpec::Path("/opt/src/pkg".into())
        );
        assert!("  ".parse::<SourceSpec>().is_err());
    }

    #[test]
    fn test_download_resolves_per_arch_with_fallback() {
        let x86 = SourceSpec::Download
            .resolve("pkg", DEFAULTS, TargetArch::X86_64)
            .unwrap();
        assert_eq!(x86.file_name().as_deref(), Some("pkg-1.1.tar.gz"));

        let arm = SourceSpec::Download
            .resolve("pkg", DEFAULTS, TargetArch::Aarch64)
            .unwrap();
        assert_eq!(arm.file_name().as_deref(), Some("pkg-1.0.tar.gz"));

        let err = SourceSpec::Download
            .resolve("pkg", &[], TargetArch::Aarch64)
            .unwrap_err();
        assert!(err.to_string().contains("pkg"));

        let explicit = SourceSpec::Path("/src".into());
        assert_eq!(explicit.resolve("pkg", &[], TargetArch::Other).unwrap(), explicit);
    }

    #[test]
    fn test_archive_kind_detection() {
        assert_eq!(ArchiveKind::from_file_name("a.tar.gz"), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::from_file_name("a.TGZ"), Some(ArchiveKind::TarGz));
        assert_eq!(ArchiveKind::from_file_name("a.tar"), Some(ArchiveKind::Tar));
        assert_eq!(ArchiveKind::from_file_name("a.zip"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::from_file_name("a.tar.bz2"), None);
    }

    #[test]
    fn test_layout_and_uid() {
        let uid = installation_uid(
            "binutils",
            &SourceSpec::Download,
            TargetOs::Linux,
            TargetArch::X86_64,
            "abc",
        );
        let other = installation_uid(
            "binutils",
            &SourceSpec::Download,
            TargetOs::Linux,
            TargetArch::X86_64,
            "abd",
        );
        assert_ne!(uid, other);

        let layout = InstallLayout::new(Path::new("/home/u/.taucf"), "binutils", &uid);
        assert_eq!(layout.lib_dir, layout.prefix.join("lib"));
        assert!(layout.prefix.starts_with("/home/u/.taucf/packages/binutils"));
        assert!(!layout.staging_dir.starts_with(&layout.prefix));
    }
}
