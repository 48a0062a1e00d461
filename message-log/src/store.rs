//! Raw line storage behind the message log.
//!
//! A store knows nothing about the line layout; it only appends, truncates
//! and reads lines. [`FileStore`] opens the file for every call and closes it
//! before returning, so no handle outlives an operation.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Appends `line` followed by a newline.
    async fn append_line(&self, line: &str) -> io::Result<()>;

    /// Removes every line. Clearing storage that was never written succeeds.
    async fn clear(&self) -> io::Result<()>;

    /// Returns all lines in write order. Storage that was never written
    /// reads as empty.
    async fn read_lines(&self) -> io::Result<Vec<String>>;
}

/// Newline-delimited text file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MessageStore for FileStore {
    async fn append_line(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;
        // One write call per record keeps a line from being split between
        // two buffered writes.
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn clear(&self) -> io::Result<()> {
        match OpenOptions::new().write(true).open(&self.path).await {
            Ok(file) => file.set_len(0).await,
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn read_lines(&self) -> io::Result<Vec<String>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        // Invalid UTF-8 is replaced per byte so one damaged line cannot hide
        // the rest. `lines` also drops the `\r` of CRLF endings.
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect())
    }
}

/// In-process store for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lines: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with pre-encoded lines.
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Mutex::new(lines.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append_line(&self, line: &str) -> io::Result<()> {
        self.lines.lock().await.push(line.to_string());
        Ok(())
    }

    async fn clear(&self) -> io::Result<()> {
        self.lines.lock().await.clear();
        Ok(())
    }

    async fn read_lines(&self) -> io::Result<Vec<String>> {
        Ok(self.lines.lock().await.clone())
    }
}
