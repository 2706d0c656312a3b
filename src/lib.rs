//! # vocalis
//!
//! Multi-language text-to-speech HTTP service around per-language ONNX voice
//! models.
//!
//! The engine behind each language accepts at most a fixed number of
//! characters per call. The service works around that limit with a
//! split-and-stitch pipeline:
//!
//! 1. **Normalization** — `*` emphasis markup stripped; numbers, ordinals,
//!    percentages and currency amounts expanded to spoken words (English).
//! 2. **Splitting** — text over the limit is cut at natural boundaries,
//!    trying sentences first, then clauses, then words.
//! 3. **Rendering** — each segment goes through the per-language engine
//!    lock; engines are never invoked in parallel for the same language.
//! 4. **Stitching** — segment clips are concatenated with fixed 500 ms
//!    silence gaps into one continuous waveform.
//! 5. **Delivery** — WAV bytes with duration and content-hash headers, and
//!    optional session-scoped persistence on disk.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use vocalis::registry::{EngineRegistry, Lang};
//! use vocalis::service::{GenerateRequest, TtsService};
//! use vocalis::session::SessionStore;
//!
//! # async fn run() -> Result<(), vocalis::TtsError> {
//! // Download (first run) and load the English voice model.
//! let registry = EngineRegistry::bootstrap(&[Lang::En], Path::new("models"));
//! let service = TtsService::new(
//!     Arc::new(registry),
//!     SessionStore::new("sessions"),
//!     1000,
//!     Duration::from_secs(120),
//! );
//!
//! let generated = service
//!     .generate(GenerateRequest {
//!         lang: Lang::En,
//!         speaker: "en_0".into(),
//!         text: "Hello from Rust!".into(),
//!         use_ssml: false,
//!         session: String::new(),
//!     })
//!     .await?;
//!
//! generated.clip.write_wav(Path::new("output.wav"))?;
//! # Ok(())
//! # }
//! ```
//!
//! The `vocalis-server` binary wires the same service into an axum router
//! with `POST /tts/generate` and `GET /tts/speakers`.

pub mod audio;
pub mod config;
pub mod download;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod server;
pub mod service;
pub mod session;
pub mod split;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use audio::{AudioClip, SILENCE_GAP_MS};
pub use engine::{RenderRequest, SynthesisEngine, SAMPLE_RATE};
pub use error::TtsError;
pub use registry::{EngineRegistry, Lang, SpeakerInfo};
pub use service::{GenerateRequest, GeneratedAudio, TtsService};
