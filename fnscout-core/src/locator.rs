// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Manifest file lookup.
//!
//! Reads the well-known manifest file from a functions source directory.
//! A missing file is an expected outcome (`Ok(None)`); any other I/O failure
//! is a hard error. File access goes through [`ManifestReader`] so callers
//! and tests can swap the filesystem out.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::manifest::ManifestDocument;

/// Default manifest file name inside a functions directory.
pub const DEFAULT_MANIFEST_FILE: &str = "backend.yaml";

/// Capability to read a file into a string.
#[async_trait]
pub trait ManifestReader: Send + Sync {
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads from the local filesystem via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

#[async_trait]
impl ManifestReader for FsReader {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

/// True when the error means the file simply is not there.
///
/// Relies on the platform mapping its raw code (`ENOENT` and friends) onto
/// `ErrorKind::NotFound`.
pub fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Finds and parses the manifest file of a directory.
#[derive(Debug, Clone)]
pub struct ManifestLocator<R = FsReader> {
    reader: R,
    file_name: String,
}

impl ManifestLocator<FsReader> {
    /// Locator over the real filesystem using [`DEFAULT_MANIFEST_FILE`].
    pub fn filesystem() -> Self {
        Self::new(FsReader, DEFAULT_MANIFEST_FILE)
    }
}

impl<R: ManifestReader> ManifestLocator<R> {
    pub fn new(reader: R, file_name: impl Into<String>) -> Self {
        Self {
            reader,
            file_name: file_name.into(),
        }
    }

    /// Path the manifest is expected at.
    pub fn manifest_path(&self, directory: &Path) -> PathBuf {
        directory.join(&self.file_name)
    }

    /// Read and parse the manifest in `directory`.
    ///
    /// Returns `Ok(None)` if the file does not exist. The document is only
    /// parsed as YAML; schema validation is the decoder's job.
    pub async fn locate(&self, directory: &Path) -> DiscoveryResult<Option<ManifestDocument>> {
        let path = self.manifest_path(directory);

        let content = match self.reader.read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if is_not_found(&e) => {
                tracing::debug!(path = %path.display(), "No manifest file found");
                return Ok(None);
            }
            Err(e) => {
                return Err(DiscoveryError::Io {
                    context: "reading manifest file",
                    path,
                    source: e,
                })
            }
        };

        tracing::debug!(path = %path.display(), bytes = content.len(), "Read manifest file");

        ManifestDocument::parse(&content).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Reader returning a canned result and recording requested paths.
    struct FakeReader {
        result: fn() -> io::Result<String>,
        requested: Mutex<Vec<PathBuf>>,
    }

    impl FakeReader {
        fn new(result: fn() -> io::Result<String>) -> Self {
            Self {
                result,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ManifestReader for FakeReader {
        async fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.requested.lock().unwrap().push(path.to_path_buf());
            (self.result)()
        }
    }

    #[tokio::test]
    async fn test_found_manifest_is_parsed() {
        let locator = ManifestLocator::new(
            FakeReader::new(|| Ok("specVersion: v1alpha1\n".to_string())),
            DEFAULT_MANIFEST_FILE,
        );
        let doc = locator.locate(Path::new("directory")).await.unwrap().unwrap();
        assert_eq!(doc.spec_version().unwrap(), "v1alpha1");

        let requested = locator.reader.requested.lock().unwrap();
        assert_eq!(requested.as_slice(), &[PathBuf::from("directory/backend.yaml")]);
    }

    #[tokio::test]
    async fn test_not_found_is_absence() {
        let locator = ManifestLocator::new(
            FakeReader::new(|| Err(io::Error::from(io::ErrorKind::NotFound))),
            DEFAULT_MANIFEST_FILE,
        );
        assert!(locator.locate(Path::new("directory")).await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_raw_enoent_is_absence() {
        // ENOENT = 2 on every unix we build for
        let locator = ManifestLocator::new(
            FakeReader::new(|| Err(io::Error::from_raw_os_error(2))),
            DEFAULT_MANIFEST_FILE,
        );
        assert!(locator.locate(Path::new("directory")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_permission_denied_is_hard_error() {
        let locator = ManifestLocator::new(
            FakeReader::new(|| Err(io::Error::from(io::ErrorKind::PermissionDenied))),
            DEFAULT_MANIFEST_FILE,
        );
        let err = locator.locate(Path::new("directory")).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Io { .. }));
    }

    #[tokio::test]
    async fn test_malformed_yaml_is_hard_error() {
        let locator = ManifestLocator::new(
            FakeReader::new(|| Ok("specVersion: [oops\n".to_string())),
            DEFAULT_MANIFEST_FILE,
        );
        let err = locator.locate(Path::new("directory")).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::ManifestParse { .. }));
    }

    #[test]
    fn test_custom_file_name() {
        let locator = ManifestLocator::new(
            FakeReader::new(|| Err(io::Error::from(io::ErrorKind::NotFound))),
            "functions.yaml",
        );
        assert_eq!(
            locator.manifest_path(Path::new("src")),
            PathBuf::from("src/functions.yaml")
        );
    }
}
