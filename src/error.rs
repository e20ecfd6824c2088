//! Crate-wide error type.
//!
//! Nothing in the library retries or swallows these; they bubble up to the
//! agent runner, which records them in the run summary before returning.

use std::io;
use std::path::PathBuf;

use crate::llm::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing credential, empty conversation, unreadable config.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unsupported provider '{0}'. Supported values: openai, google, ollama.")]
    UnsupportedProvider(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The model reply could not be turned into the expected structure.
    /// The raw text has already been written to disk when this is returned.
    #[error("malformed model response: {reason}")]
    MalformedResponse { reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
