use std::error::Error as StdError;

use thiserror::Error;

/// Tartil's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Tartil's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// A surah or ayah index fell outside the corpus bounds.
    ///
    /// This is an integration bug, not a runtime condition, and is never suppressed.
    #[error("{} out of range (expected 1..={max})", index_label(.surah, .ayah))]
    OutOfRange {
        surah: usize,
        ayah: Option<usize>,
        max: usize,
    },

    /// A single transcript segment was rejected. Callers skip it and keep going.
    #[error("malformed segment: {0}")]
    MalformedSegment(String),

    /// The engine was invoked without the inputs it needs.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("invalid corpus: {0}")]
    InvalidCorpus(String),

    /// An external collaborator (audio fetch, transcription) failed.
    #[error("{stage} failed: {message}")]
    Upstream {
        stage: &'static str,
        message: String,
    },

    #[error("alignment cancelled")]
    Cancelled,

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub(crate) fn surah_out_of_range(surah: usize, max: usize) -> Self {
        Self::OutOfRange {
            surah,
            ayah: None,
            max,
        }
    }

    pub(crate) fn ayah_out_of_range(surah: usize, ayah: usize, max: usize) -> Self {
        Self::OutOfRange {
            surah,
            ayah: Some(ayah),
            max,
        }
    }

    pub(crate) fn upstream(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Upstream {
            stage,
            message: err.to_string(),
        }
    }

    /// Whether this error is a corpus bounds violation.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}

fn index_label(surah: &usize, ayah: &Option<usize>) -> String {
    match ayah {
        Some(ayah) => format!("ayah {ayah} of surah {surah}"),
        None => format!("surah {surah}"),
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
