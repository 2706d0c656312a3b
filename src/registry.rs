//! Per-language engine registry.
//!
//! Owns one loaded [`SynthesisEngine`] per language for the lifetime of the
//! process. Engines are not safe for parallel invocation, so every synthesis
//! call is serialized behind a per-language async lock; requests for
//! different languages proceed in parallel on independent engines.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::audio::AudioClip;
use crate::download;
use crate::engine::{OnnxSpeechModel, RenderRequest, SynthesisEngine};
use crate::error::{Result, TtsError};

// ─────────────────────────────────────────────────────────────────────────────
// Languages
// ─────────────────────────────────────────────────────────────────────────────

/// Languages with a published voice model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    Es,
    Ua,
}

impl Lang {
    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Es => "es",
            Lang::Ua => "ua",
        }
    }

    /// Fixed download URL for this language's voice model.
    pub fn model_url(self) -> &'static str {
        match self {
            Lang::En => "https://models.vocalis.dev/tts/en/v3_en.onnx",
            Lang::Es => "https://models.vocalis.dev/tts/es/v3_es.onnx",
            Lang::Ua => "https://models.vocalis.dev/tts/ua/v4_ua.onnx",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A speaker entry in the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerInfo {
    pub speaker_id: String,
    pub display_name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

struct EngineSlot {
    engine: Arc<dyn SynthesisEngine>,
    /// Serializes synthesis for this language. Waiting here is cancellable;
    /// in-progress inference is not. The engine also guards its session
    /// internally, so a caller that gives up mid-wait never breaks safety.
    gate: Mutex<()>,
}

pub struct EngineRegistry {
    slots: BTreeMap<Lang, EngineSlot>,
}

impl EngineRegistry {
    /// Download (on first run) and load one engine per requested language.
    ///
    /// Loading is synchronous and blocking. A language that fails to
    /// download or load is logged and skipped; the registry still serves
    /// the others, and requests for the failed language get
    /// [`TtsError::EngineUnavailable`].
    pub fn bootstrap(languages: &[Lang], model_dir: &Path) -> Self {
        let mut slots = BTreeMap::new();
        for &lang in languages {
            match load_language(lang, model_dir) {
                Ok(engine) => {
                    info!("Loaded {lang} voice model ({} speakers)", engine.speakers().len());
                    slots.insert(lang, EngineSlot { engine, gate: Mutex::new(()) });
                }
                Err(err) => error!("Skipping language {lang}: {err:#}"),
            }
        }
        Self { slots }
    }

    /// Build a registry from pre-constructed engines. Used by tests and by
    /// embedders that bring their own backend.
    pub fn from_engines(
        engines: impl IntoIterator<Item = (Lang, Arc<dyn SynthesisEngine>)>,
    ) -> Self {
        Self {
            slots: engines
                .into_iter()
                .map(|(lang, engine)| (lang, EngineSlot { engine, gate: Mutex::new(()) }))
                .collect(),
        }
    }

    fn slot(&self, lang: Lang) -> Result<&EngineSlot> {
        self.slots.get(&lang).ok_or(TtsError::EngineUnavailable { lang })
    }

    pub fn is_loaded(&self, lang: Lang) -> bool {
        self.slots.contains_key(&lang)
    }

    pub fn any_loaded(&self) -> bool {
        !self.slots.is_empty()
    }

    /// Speaker ids for one language, in model order.
    pub fn speakers_for(&self, lang: Lang) -> Result<Vec<String>> {
        Ok(self.slot(lang)?.engine.speakers().to_vec())
    }

    /// Ordered `lang -> speakers` listing across all loaded languages.
    pub fn speakers(&self) -> BTreeMap<Lang, Vec<SpeakerInfo>> {
        self.slots
            .iter()
            .map(|(lang, slot)| {
                let speakers = slot
                    .engine
                    .speakers()
                    .iter()
                    .map(|id| SpeakerInfo { speaker_id: id.clone(), display_name: id.clone() })
                    .collect();
                (*lang, speakers)
            })
            .collect()
    }

    /// Render one request, serialized against other requests for the same
    /// language. Inference runs on a blocking thread; dropping the returned
    /// future while queued for the gate cancels cleanly.
    pub async fn render(&self, lang: Lang, request: RenderRequest) -> Result<AudioClip> {
        let slot = self.slot(lang)?;
        let engine = Arc::clone(&slot.engine);
        let _serialized = slot.gate.lock().await;
        tokio::task::spawn_blocking(move || engine.synthesize(&request))
            .await
            .map_err(|err| TtsError::Render(anyhow::anyhow!("synthesis task failed: {err}")))?
    }
}

fn load_language(lang: Lang, model_dir: &Path) -> anyhow::Result<Arc<dyn SynthesisEngine>> {
    let model_path = download::ensure_cached(model_dir, lang.model_url())?;
    let engine = OnnxSpeechModel::load(&model_path, lang.code())?;
    Ok(Arc::new(engine))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
