//! Module defining the errors which are exposed to the users of the crate

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The data file does not exist
    #[error("data file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The data file of a compiled fixture does not exist. Usually a misconfigured root path.
    #[error(
        "fixture '{fixture}': data file not found at '{}'. Check that `{setting}` is set correctly.",
        .path.display()
    )]
    FixtureDataNotFound {
        fixture: String,
        path: PathBuf,
        setting: &'static str,
    },

    /// The path exists but is no regular file, or arguments don't fit a signature
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No loader is registered for the extension
    #[error("unsupported file format: {extension:?}")]
    UnsupportedFormat { extension: String },

    /// Malformed content for a known format
    #[error("invalid {format} data: {message}")]
    InvalidData {
        format: &'static str,
        message: String,
    },

    /// A loader failed with something else than malformed content
    #[error("failed to load {}: {source}", .path.display())]
    LoadFailure {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// A mapping operation was invoked on data which is no mapping
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// The client for a storage provider is not compiled in
    #[error("{provider} support is not available, enable the `{feature}` feature")]
    DependencyMissing {
        provider: &'static str,
        feature: &'static str,
    },

    /// Required environment or credential configuration is absent
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors raised by user code or storage providers
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// True for both the plain and the fixture-clarified "not found" errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::FixtureDataNotFound { .. }
        )
    }
}

pub(crate) fn invalid_data(format: &'static str, message: impl ToString) -> Error {
    Error::InvalidData {
        format,
        message: message.to_string(),
    }
}

pub(crate) fn load_failure(path: &Path, source: Error) -> Error {
    Error::LoadFailure {
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}

pub(crate) fn not_a_mapping(found: &str) -> Error {
    Error::TypeMismatch(format!("data is not a dictionary (found {found})"))
}
