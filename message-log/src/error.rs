use thiserror::Error;

/// Errors produced by the message log and file storage.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field was missing or empty.
    #[error("{0}")]
    Validation(String),

    /// A file path escaped the storage root or was otherwise unusable.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl Error {
    /// True for errors caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::InvalidPath(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
