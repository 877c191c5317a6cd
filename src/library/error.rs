use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::RecordId;

#[derive(Error, Debug)]
pub enum LibraryError {
    /// The path exists but cannot be read, or the destination cannot be
    /// written.
    #[error("cannot access `{}`: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV in `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("no book with id {0}")]
    NotFound(RecordId),
}

impl LibraryError {
    pub(crate) fn file_access(path: &Path, source: io::Error) -> Self {
        Self::FileAccess {
            path: path.to_path_buf(),
            source,
        }
    }

    /// I/O failures surfaced through the CSV reader or writer are access
    /// problems, everything else is a format problem.
    pub(crate) fn from_csv(path: &Path, err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(io_err) => Self::file_access(
                path,
                io::Error::new(io_err.kind(), io_err.to_string()),
            ),
            _ => Self::Parse {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
