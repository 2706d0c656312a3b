//! Audio clip container and silence-gap stitching.
//!
//! Clips are mono PCM at the engine's fixed sample rate, held in memory as
//! `f32` samples. Long-text generation renders one clip per text segment and
//! joins them with [`concat_with_gaps`]; the WAV encoding matches the
//! response body and session files (16-bit PCM for broad decoder support).

use std::io::Cursor;
use std::path::Path;

use crate::error::Result;

/// Silence inserted between consecutive stitched segments, in milliseconds.
pub const SILENCE_GAP_MS: u64 = 500;

// ─────────────────────────────────────────────────────────────────────────────
// AudioClip
// ─────────────────────────────────────────────────────────────────────────────

/// Mono PCM audio at a fixed sample rate, samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl AudioClip {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self { sample_rate, samples }
    }

    pub fn empty(sample_rate: u32) -> Self {
        Self { sample_rate, samples: Vec::new() }
    }

    /// A clip of `ms` milliseconds of silence.
    pub fn silence(sample_rate: u32, ms: u64) -> Self {
        let count = (u64::from(sample_rate) * ms / 1000) as usize;
        Self { sample_rate, samples: vec![0.0; count] }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_ms(&self) -> u64 {
        self.samples.len() as u64 * 1000 / u64::from(self.sample_rate)
    }

    /// Append another clip's samples. All clips in one request come from the
    /// same engine, so the rates always agree.
    pub fn append(&mut self, other: &AudioClip) {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        self.samples.extend_from_slice(&other.samples);
    }

    /// Encode as a 16-bit PCM WAV file in memory.
    pub fn wav_bytes(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in &self.samples {
            // Convert f32 [-1.0, 1.0] → i16 [-32768, 32767].
            let s16 = (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            writer.write_sample(s16)?;
        }
        writer.finalize()?;
        Ok(cursor.into_inner())
    }

    /// Write the clip to a WAV file on disk.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.wav_bytes()?)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stitching
// ─────────────────────────────────────────────────────────────────────────────

/// Concatenate clips in order with a fixed silence gap between consecutive
/// clips.
///
/// The result duration is the sum of the clip durations plus
/// `gap_ms * (clips.len() - 1)`, exactly. An empty slice yields an empty
/// clip.
pub fn concat_with_gaps(clips: &[AudioClip], sample_rate: u32, gap_ms: u64) -> AudioClip {
    let gap = AudioClip::silence(sample_rate, gap_ms);
    let mut combined = AudioClip::empty(sample_rate);
    for (i, clip) in clips.iter().enumerate() {
        if i > 0 {
            combined.append(&gap);
        }
        combined.append(clip);
    }
    combined
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
