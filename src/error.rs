use std::path::PathBuf;

use thiserror::Error;

/// Error type for plan validation, filesystem and serialization failures.
///
/// Configuration problems are caught before any file is written; everything
/// else surfaces synchronously to the per-subject caller. There is no retry
/// and no cleanup of sibling files already written.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("filesystem error at `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not serialize JSON for `{path}`: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("could not write NIfTI data for `{path}`: {source}")]
    Nifti {
        path: PathBuf,
        source: binrw::Error,
    },
}

impl Error {
    /// Attach the offending path to a raw IO error.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
