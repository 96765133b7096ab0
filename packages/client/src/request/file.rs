//! File payloads for multipart uploads

use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::{Error, Result};

/// A named file to be uploaded as part of a multipart body.
///
/// The content is read lazily: a path-backed `FileRef` opens its file only
/// when the multipart encoder consumes it, and the handle is dropped exactly
/// once whether the read succeeds or fails. In-memory refs are cheap to
/// clone and never touch the filesystem.
#[derive(Debug, Clone)]
pub struct FileRef {
    file_name: String,
    source: FileSource,
}

#[derive(Debug, Clone)]
enum FileSource {
    Memory(Bytes),
    Path(PathBuf),
}

impl FileRef {
    /// Create a file payload from an in-memory byte buffer.
    pub fn from_bytes(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            source: FileSource::Memory(data.into()),
        }
    }

    /// Create a file payload backed by a filesystem path.
    ///
    /// The file name is the final path component; the file itself is not
    /// opened until the body is encoded.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_name,
            source: FileSource::Path(path),
        }
    }

    /// The name reported in the multipart `filename` attribute.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Path of the backing file, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Path(path) => Some(path),
            FileSource::Memory(_) => None,
        }
    }

    /// Materialize the file content for encoding.
    pub(crate) fn read(&self) -> Result<Bytes> {
        match &self.source {
            FileSource::Memory(data) => Ok(data.clone()),
            FileSource::Path(path) => std::fs::read(path).map(Bytes::from).map_err(|err| {
                Error::Encoding(format!("failed to read file '{}': {err}", path.display()))
            }),
        }
    }
}
