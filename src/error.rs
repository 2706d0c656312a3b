//! Error taxonomy for the synthesis pipeline.
//!
//! Every failure a caller can observe is a [`TtsError`] variant, so the HTTP
//! layer can map each case to a status code and callers embedding the library
//! can decide to truncate, reject, or report instead of crashing.

use std::time::Duration;

use crate::registry::Lang;

pub type Result<T> = std::result::Result<T, TtsError>;

#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// A single word is longer than the per-call character limit. No finer
    /// boundary exists, so the request cannot be served at all.
    #[error("cannot split further: a single word of {len} characters exceeds the {limit}-character limit")]
    UnsplittableUnit { word: String, len: usize, limit: usize },

    /// The language is not loaded — either it was not configured or its
    /// model failed to download or load at startup.
    #[error("no synthesis engine is loaded for language '{lang}'")]
    EngineUnavailable { lang: Lang },

    #[error("speaker '{speaker}' is not available for language '{lang}'")]
    UnknownSpeaker { lang: Lang, speaker: String },

    #[error("text is empty after normalization")]
    EmptyText,

    #[error("invalid session id '{session}': only ASCII alphanumerics, '-' and '_' are allowed")]
    InvalidSession { session: String },

    /// The underlying synthesis call failed. In a multi-segment stitch this
    /// aborts the whole request; no partial audio is returned.
    #[error("audio rendering failed")]
    Render(#[source] anyhow::Error),

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("WAV encoding failed")]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
