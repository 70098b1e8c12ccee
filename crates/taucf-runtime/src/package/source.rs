//! Fetching and unpacking package sources.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use taucf_core::ports::SourceAcquirer;
use taucf_core::{ArchiveKind, CfError, CfResult, SourceSpec};
use tracing::{debug, info};

/// Stages sources from URLs, local archives and local directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveAcquirer;

impl ArchiveAcquirer {
    pub const fn new() -> Self {
        Self
    }
}

impl SourceAcquirer for ArchiveAcquirer {
    fn acquire(&self, source: &SourceSpec, destination: &Path) -> CfResult<PathBuf> {
        let fail = |detail: String| {
            CfError::configuration(format!("Cannot acquire source '{source}': {detail}"))
                .with_hint("Check that the source exists and is a tar.gz, tar or zip archive")
        };
        match source {
            SourceSpec::Download => Err(CfError::internal(
                "download sources must be resolved before acquisition",
            )),
            SourceSpec::Url(url) => {
                let name = source
                    .file_name()
                    .ok_or_else(|| fail("URL does not name a file".to_string()))?;
                let archive = destination.join(&name);
                download(url, &archive).map_err(fail)?;
                let root = extract(&archive, destination).map_err(fail);
                let _ = fs::remove_file(&archive);
                root
            }
            SourceSpec::Path(path) if path.is_dir() => {
                let name = path
                    .file_name()
                    .ok_or_else(|| fail("directory has no name".to_string()))?;
                let target = destination.join(name);
                info!("Copying '{}' to '{}'", path.display(), target.display());
                copy_dir_recursive(path, &target).map_err(|e| fail(e.to_string()))?;
                Ok(target)
            }
            SourceSpec::Path(path) if path.is_file() => extract(path, destination).map_err(fail),
            SourceSpec::Path(_) => Err(fail("no such file or directory".to_string())),
        }
    }
}

fn download(url: &str, to: &Path) -> Result<(), String> {
    info!("Downloading '{url}'");
    let mut response = reqwest::blocking::get(url)
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|e| e.to_string())?;
    let mut file = File::create(to).map_err(|e| format!("{}: {e}", to.display()))?;
    let bytes = response.copy_to(&mut file).map_err(|e| e.to_string())?;
    debug!(bytes, "downloaded '{url}'");
    Ok(())
}

/// Unpack `archive` into `destination` and return the source root: the
/// archive's single top-level directory, or `destination` itself.
fn extract(archive: &Path, destination: &Path) -> Result<PathBuf, String> {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let kind = ArchiveKind::from_file_name(&name)
        .ok_or_else(|| format!("unsupported archive format '{name}'"))?;
    info!("Extracting '{}'", archive.display());

    let before = top_level_entries(destination).map_err(|e| e.to_string())?;
    let file = File::open(archive).map_err(|e| format!("{}: {e}", archive.display()))?;
    let reader = BufReader::new(file);
    match kind {
        ArchiveKind::TarGz => tar::Archive::new(GzDecoder::new(reader)).unpack(destination),
        ArchiveKind::Tar => tar::Archive::new(reader).unpack(destination),
        ArchiveKind::Zip => zip::ZipArchive::new(reader)
            .and_then(|mut zip| zip.extract(destination))
            .map_err(io::Error::other),
    }
    .map_err(|e| format!("extraction failed: {e}"))?;

    let added: Vec<PathBuf> = top_level_entries(destination)
        .map_err(|e| e.to_string())?
        .into_iter()
        .filter(|p| !before.contains(p))
        .collect();
    match added.as_slice() {
        [single] if single.is_dir() => Ok(single.clone()),
        _ => Ok(destination.to_path_buf()),
    }
}

fn top_level_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        entries.push(entry?.path());
    }
    Ok(entries)
}

/// Copy a directory tree. File permissions are preserved.
pub(crate) fn copy_dir_recursive(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use taucf_core::ErrorKind;
    use tempfile::TempDir;

    fn write_tarball(path: &Path) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        let body = b"#!/bin/sh\nexit 0\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, "pkg-1.0/configure", &body[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_local_tarball_unpacks_to_its_top_directory() {
        let tmp = TempDir::new().unwrap();
        let tarball = tmp.path().join("pkg-1.0.tar.gz");
        write_tarball(&tarball);
        let staging = tmp.path().join("staging");
        fs::create_dir(&staging).unwrap();

        let root = ArchiveAcquirer::new()
            .acquire(&SourceSpec::Path(tarball), &staging)
            .unwrap();
        assert_eq!(root, staging.join("pkg-1.0"));
        assert!(root.join("configure").is_file());
    }

    #[test]
    fn test_local_directory_is_copied() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("pkg");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("sub/file.txt"), "x").unwrap();
        let staging = tmp.path().join("staging");
        fs::create_dir(&staging).unwrap();

        let root = ArchiveAcquirer::new()
            .acquire(&SourceSpec::Path(src.clone()), &staging)
            .unwrap();
        assert_eq!(root, staging.join("pkg"));
        assert_eq!(fs::read_to_string(root.join("sub/file.txt")).unwrap(), "x");
        assert!(src.join("sub/file.txt").exists());
    }

    #[test]
    fn test_missing_and_unknown_sources_are_configuration_errors() {
        let tmp = TempDir::new().unwrap();
        let missing = SourceSpec::Path(tmp.path().join("nope.tar.gz"));
        let err = ArchiveAcquirer::new().acquire(&missing, tmp.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("nope.tar.gz"));

        let odd = tmp.path().join("pkg.rar");
        fs::write(&odd, "junk").unwrap();
        let err = ArchiveAcquirer::new()
            .acquire(&SourceSpec::Path(odd), tmp.path())
            .unwrap_err();
        assert!(err.to_string().contains("unsupported archive format"));
    }
}
