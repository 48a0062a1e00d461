//! Whole-file save and read with structured logging.
//!
//! Unlike the message log this replaces the file contents on every save.
//! [`FileStorage`] confines network callers to one directory; the free
//! functions take any path and are used directly by the CLI.

use std::path::{Component, Path, PathBuf};

use tracing::{error, info};

use crate::error::{Error, Result};
use crate::trace::TraceId;

/// Per-operation figures attached to the log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMetrics {
    pub content_size: usize,
    pub bytes_read: usize,
    pub operation: &'static str,
}

/// Replaces the contents of `path` with `data`.
pub async fn save_data(path: &Path, data: &str, trace: TraceId) -> Result<()> {
    let metrics = FileMetrics {
        content_size: data.len(),
        operation: "write",
        ..FileMetrics::default()
    };
    info!(trace_id = %trace, path = %path.display(), ?metrics, "starting file write");

    if let Err(err) = tokio::fs::write(path, data).await {
        error!(trace_id = %trace, path = %path.display(), error = %err, "file write failed");
        return Err(err.into());
    }

    info!(trace_id = %trace, path = %path.display(), "file written");
    Ok(())
}

/// Reads the whole of `path` as UTF-8.
pub async fn read_data(path: &Path, trace: TraceId) -> Result<String> {
    info!(trace_id = %trace, path = %path.display(), "starting file read");

    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(err) => {
            error!(trace_id = %trace, path = %path.display(), error = %err, "file read failed");
            return Err(err.into());
        }
    };

    let metrics = FileMetrics {
        bytes_read: contents.len(),
        operation: "read",
        ..FileMetrics::default()
    };
    info!(trace_id = %trace, path = %path.display(), ?metrics, "file read");
    Ok(contents)
}

/// File access rooted at one directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a caller-supplied relative path into the root. Absolute paths
    /// and `..` components are rejected.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let candidate = Path::new(relative);
        let mut resolved = self.root.clone();
        let mut has_name = false;
        for component in candidate.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    has_name = true;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::InvalidPath(relative.to_string()));
                }
            }
        }
        if !has_name {
            return Err(Error::InvalidPath(relative.to_string()));
        }
        Ok(resolved)
    }

    pub async fn save(&self, relative: &str, data: &str, trace: TraceId) -> Result<()> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        save_data(&path, data, trace).await
    }

    pub async fn read(&self, relative: &str, trace: TraceId) -> Result<String> {
        let path = self.resolve(relative)?;
        read_data(&path, trace).await
    }
}
