//! Session-scoped persistence of generated clips.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::audio::AudioClip;
use crate::error::{Result, TtsError};

/// Append-only store grouping generated clips by a caller-chosen session id.
///
/// Layout: `<root>/<session>/tts_<session>_<unixtime>_<speaker>_.wav`, one
/// file per generation call. A session directory is created on first use and
/// never cleaned up automatically — the caller owns its lifecycle.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The caller supplies the session id verbatim; restricting the charset
    /// keeps it safe to embed in a directory name and a file name.
    fn validate(session: &str) -> Result<()> {
        let valid = !session.is_empty()
            && session.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(())
        } else {
            Err(TtsError::InvalidSession { session: session.to_string() })
        }
    }

    /// Persist `clip` under `session`, returning the new file's path.
    pub fn persist(&self, session: &str, speaker: &str, clip: &AudioClip) -> Result<PathBuf> {
        Self::validate(session)?;

        let dir = self.root.join(session);
        std::fs::create_dir_all(&dir)?;

        let unixtime =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let path = dir.join(format!("tts_{session}_{unixtime}_{speaker}_.wav"));
        clip.write_wav(&path)?;

        debug!("Persisted session clip to {}", path.display());
        Ok(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
