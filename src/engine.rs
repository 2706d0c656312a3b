//! Synthesis engine handles.
//!
//! The registry treats every engine as an opaque handle with a single
//! `synthesize` capability. The concrete implementation here runs a
//! per-language ONNX voice model with [`ort`] (ONNX Runtime bindings). The
//! model carries its own text frontend, so the input is the raw character
//! sequence — SSML markup included when requested — plus the speaker index
//! and the output sample rate:
//!
//! | Name          | Shape          | dtype |
//! |---------------|----------------|-------|
//! | `input_ids`   | `[1, seq_len]` | int64 |
//! | `speaker_id`  | `[1]`          | int64 |
//! | `sample_rate` | `[1]`          | int64 |

use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use ort::{session::Session, value::Tensor};

use crate::audio::AudioClip;
use crate::error::{Result, TtsError};

/// Audio sample rate produced by the voice models.
pub const SAMPLE_RATE: u32 = 48_000;

/// One synthesis call: plain text or a complete SSML document.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub text: String,
    pub speaker: String,
    /// The text is an SSML document to be interpreted, not read literally.
    pub ssml: bool,
}

/// Opaque handle to one loaded synthesis engine.
///
/// Implementations are not required to be safe for parallel invocation;
/// callers serialize access per engine.
pub trait SynthesisEngine: Send + Sync {
    /// Speaker ids this engine can voice, in model order.
    fn speakers(&self) -> &[String];

    /// Render `request` into a waveform at [`SAMPLE_RATE`].
    fn synthesize(&self, request: &RenderRequest) -> Result<AudioClip>;
}

// ─────────────────────────────────────────────────────────────────────────────
// ONNX-backed engine
// ─────────────────────────────────────────────────────────────────────────────

/// Encode text as the character-id sequence the model's frontend consumes.
pub(crate) fn char_ids(text: &str) -> Vec<i64> {
    text.chars().map(|c| c as i64).collect()
}

/// ONNX voice model behind an [`ort`] session.
///
/// The session is guarded by a mutex: the inference backend is effectively
/// single-threaded and not safe for concurrent invocation.
pub struct OnnxSpeechModel {
    session: Mutex<Session>,
    speakers: Vec<String>,
}

impl OnnxSpeechModel {
    /// Load a voice model from disk.
    ///
    /// The speaker roster is read from the `speakers` key of the model
    /// metadata (comma-separated ids). Models without the key expose a
    /// single default voice named `<fallback>_0`.
    pub fn load(model_path: &Path, fallback: &str) -> anyhow::Result<Self> {
        let session = Session::builder()
            .context("Failed to create ORT session builder")?
            .commit_from_file(model_path)
            .with_context(|| format!("Cannot load ONNX model: {}", model_path.display()))?;

        let roster = session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom("speakers"));
        let speakers: Vec<String> = match roster {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => vec![format!("{fallback}_0")],
        };

        Ok(Self { session: Mutex::new(session), speakers })
    }

    fn speaker_index(&self, speaker: &str) -> Option<i64> {
        self.speakers.iter().position(|s| s == speaker).map(|i| i as i64)
    }
}

impl SynthesisEngine for OnnxSpeechModel {
    fn speakers(&self) -> &[String] {
        &self.speakers
    }

    fn synthesize(&self, request: &RenderRequest) -> Result<AudioClip> {
        let render = |err: ort::Error, what: &'static str| {
            TtsError::Render(anyhow::Error::new(err).context(what))
        };

        // The facade validates the speaker against the roster; an unknown id
        // here means a caller bypassed it.
        let speaker_id = self.speaker_index(&request.speaker).ok_or_else(|| {
            TtsError::Render(anyhow::anyhow!(
                "speaker '{}' is not in the model roster",
                request.speaker
            ))
        })?;

        let ids = char_ids(&request.text);
        let seq_len = ids.len();

        let t_input_ids = Tensor::<i64>::from_array(([1usize, seq_len], ids))
            .map_err(|e| render(e, "Failed to build input_ids tensor"))?;

        let t_speaker = Tensor::<i64>::from_array(([1usize], vec![speaker_id]))
            .map_err(|e| render(e, "Failed to build speaker_id tensor"))?;

        let t_sample_rate = Tensor::<i64>::from_array(([1usize], vec![i64::from(SAMPLE_RATE)]))
            .map_err(|e| render(e, "Failed to build sample_rate tensor"))?;

        let mut session = self.session.lock().expect("ORT session mutex poisoned");
        let outputs = session
            .run(ort::inputs![t_input_ids, t_speaker, t_sample_rate])
            .map_err(|e| render(e, "ONNX inference failed"))?;

        // Output 0 is the raw waveform (shape [1, T] or [T]).
        let (_shape, samples) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| render(e, "Failed to extract audio tensor"))?;

        Ok(AudioClip::new(SAMPLE_RATE, samples.to_vec()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
