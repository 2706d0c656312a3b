//! Synthesis facade — orchestrates splitting, rendering, and stitching.
//!
//! Short text goes to the engine in a single call. Text over the per-call
//! character limit is split at natural boundaries, rendered segment by
//! segment through the per-language lock, and stitched back together with
//! fixed silence gaps. SSML documents always pass through whole.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::audio::{self, AudioClip, SILENCE_GAP_MS};
use crate::engine::{RenderRequest, SAMPLE_RATE};
use crate::error::{Result, TtsError};
use crate::normalize;
use crate::registry::{EngineRegistry, Lang};
use crate::session::SessionStore;
use crate::split;

/// One generation call.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub lang: Lang,
    pub speaker: String,
    pub text: String,
    pub use_ssml: bool,
    /// Caller-chosen grouping key; empty means no persistence.
    pub session: String,
}

/// A finished generation: the stitched clip and, for session requests, the
/// persisted file path.
#[derive(Debug)]
pub struct GeneratedAudio {
    pub clip: AudioClip,
    pub persisted: Option<PathBuf>,
}

pub struct TtsService {
    registry: Arc<EngineRegistry>,
    sessions: SessionStore,
    char_limit: usize,
    timeout: Duration,
}

impl TtsService {
    pub fn new(
        registry: Arc<EngineRegistry>,
        sessions: SessionStore,
        char_limit: usize,
        timeout: Duration,
    ) -> Self {
        Self { registry, sessions, char_limit, timeout }
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// Generate audio for one request, bounded by the service timeout.
    ///
    /// On timeout the queued engine work is abandoned; inference already in
    /// flight on a blocking thread runs to completion and is discarded.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GeneratedAudio> {
        match tokio::time::timeout(self.timeout, self.generate_inner(request)).await {
            Ok(result) => result,
            Err(_) => Err(TtsError::Timeout(self.timeout)),
        }
    }

    async fn generate_inner(&self, request: GenerateRequest) -> Result<GeneratedAudio> {
        // Cosmetic emphasis markup the engine cannot render.
        let text = normalize::strip_emphasis(&request.text);
        if text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }

        let speakers = self.registry.speakers_for(request.lang)?;
        if !speakers.iter().any(|s| s == &request.speaker) {
            return Err(TtsError::UnknownSpeaker {
                lang: request.lang,
                speaker: request.speaker,
            });
        }

        info!(
            "Generating {} characters with speaker {} in {}",
            text.chars().count(),
            request.speaker,
            request.lang
        );

        let clip = if request.use_ssml {
            self.render_ssml(&request, text).await?
        } else {
            self.render_text(&request, text).await?
        };

        let persisted = if request.session.is_empty() {
            None
        } else {
            Some(self.sessions.persist(&request.session, &request.speaker, &clip)?)
        };

        Ok(GeneratedAudio { clip, persisted })
    }

    /// SSML passes through whole — splitting a document would break its
    /// markup — so the engine's own input limit applies.
    async fn render_ssml(&self, request: &GenerateRequest, text: String) -> Result<AudioClip> {
        let render = RenderRequest {
            text: wrap_ssml(text),
            speaker: request.speaker.clone(),
            ssml: true,
        };
        self.registry.render(request.lang, render).await
    }

    async fn render_text(&self, request: &GenerateRequest, text: String) -> Result<AudioClip> {
        // Written forms → spoken words; the frontend is English-only.
        let text =
            if request.lang == Lang::En { normalize::normalize(&text) } else { text };

        if text.chars().count() <= self.char_limit {
            return self.render_segment(request, text).await;
        }

        warn!("Text exceeds {} characters, splitting at natural boundaries", self.char_limit);
        let segments = split::split(&text, self.char_limit)?;
        if segments.is_empty() {
            return Err(TtsError::EmptyText);
        }

        let mut clips = Vec::with_capacity(segments.len());
        for segment in segments {
            // Any failed segment aborts the whole stitch; no partial audio.
            clips.push(self.render_segment(request, segment).await?);
        }
        Ok(audio::concat_with_gaps(&clips, SAMPLE_RATE, SILENCE_GAP_MS))
    }

    async fn render_segment(&self, request: &GenerateRequest, text: String) -> Result<AudioClip> {
        let render =
            RenderRequest { text, speaker: request.speaker.clone(), ssml: false };
        self.registry.render(request.lang, render).await
    }
}

/// Wrap SSML content in a root `<speak>` element if not already wrapped.
fn wrap_ssml(text: String) -> String {
    if text.trim_start().starts_with("<speak") {
        text
    } else {
        format!("<speak>{text}</speak>")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::engine::SynthesisEngine;

    /// Scripted engine: returns a fixed-length clip per call and records
    /// every request it receives.
    struct MockEngine {
        speakers: Vec<String>,
        clip_ms: u64,
        calls: AtomicUsize,
        requests: Mutex<Vec<RenderRequest>>,
        fail_on_call: Option<usize>,
    }

    impl MockEngine {
        fn new(clip_ms: u64) -> Self {
            Self {
                speakers: vec!["en_0".into(), "en_1".into()],
                clip_ms,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                fail_on_call: None,
            }
        }

        fn failing_on(mut self, call: usize) -> Self {
            self.fail_on_call = Some(call);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn recorded(&self) -> Vec<RenderRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl SynthesisEngine for MockEngine {
        fn speakers(&self) -> &[String] {
            &self.speakers
        }

        fn synthesize(&self, request: &RenderRequest) -> Result<AudioClip> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.requests.lock().unwrap().push(request.clone());
            if self.fail_on_call == Some(call) {
                return Err(TtsError::Render(anyhow::anyhow!("scripted failure")));
            }
            Ok(AudioClip::silence(SAMPLE_RATE, self.clip_ms))
        }
    }

    fn service_with(engine: Arc<MockEngine>) -> (TtsService, tempfile::TempDir) {
        let sessions = tempfile::tempdir().unwrap();
        let registry = EngineRegistry::from_engines([(
            Lang::En,
            Arc::clone(&engine) as Arc<dyn SynthesisEngine>,
        )]);
        let service = TtsService::new(
            Arc::new(registry),
            SessionStore::new(sessions.path()),
            1000,
            Duration::from_secs(30),
        );
        (service, sessions)
    }

    fn request(text: &str) -> GenerateRequest {
        GenerateRequest {
            lang: Lang::En,
            speaker: "en_0".into(),
            text: text.into(),
            use_ssml: false,
            session: String::new(),
        }
    }

    #[tokio::test]
    async fn test_short_text_issues_exactly_one_render() {
        let engine = Arc::new(MockEngine::new(1000));
        let (service, _dir) = service_with(Arc::clone(&engine));

        let generated = service.generate(request("A short sentence.")).await.unwrap();
        assert_eq!(engine.call_count(), 1);
        assert_eq!(generated.clip.duration_ms(), 1000);
        assert!(generated.persisted.is_none());
    }

    #[tokio::test]
    async fn test_long_text_splits_and_stitches_with_gaps() {
        let engine = Arc::new(MockEngine::new(1000));
        let (service, _dir) = service_with(Arc::clone(&engine));

        // Three ~600-character sentences: pairwise over the 1000 limit, so
        // the splitter emits three segments.
        let sentence = "word ".repeat(120);
        let text = format!("{s}. {s}. {s}.", s = sentence.trim());
        let generated = service.generate(request(&text)).await.unwrap();

        assert_eq!(engine.call_count(), 3);
        // 3 sub-clips of 1000 ms plus 2 embedded 500 ms silences.
        assert_eq!(generated.clip.duration_ms(), 3 * 1000 + 2 * 500);
    }

    #[tokio::test]
    async fn test_render_failure_aborts_whole_stitch() {
        let engine = Arc::new(MockEngine::new(1000).failing_on(2));
        let (service, _dir) = service_with(Arc::clone(&engine));

        let sentence = "word ".repeat(120);
        let text = format!("{s}. {s}. {s}.", s = sentence.trim());
        let err = service.generate(request(&text)).await.unwrap_err();

        assert!(matches!(err, TtsError::Render(_)));
        // The failing second segment stops the loop before the third.
        assert_eq!(engine.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unsplittable_word_rejected() {
        let engine = Arc::new(MockEngine::new(1000));
        let (service, _dir) = service_with(Arc::clone(&engine));

        let text = format!("Intro sentence. {}", "x".repeat(1100));
        let err = service.generate(request(&text)).await.unwrap_err();
        assert!(matches!(err, TtsError::UnsplittableUnit { .. }));
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let engine = Arc::new(MockEngine::new(1000));
        let (service, _dir) = service_with(Arc::clone(&engine));

        for text in ["", "   ", "***"] {
            let err = service.generate(request(text)).await.unwrap_err();
            assert!(matches!(err, TtsError::EmptyText), "text {text:?}");
        }
    }

    #[tokio::test]
    async fn test_unknown_speaker_rejected() {
        let engine = Arc::new(MockEngine::new(1000));
        let (service, _dir) = service_with(Arc::clone(&engine));

        let mut req = request("Hello.");
        req.speaker = "nope".into();
        let err = service.generate(req).await.unwrap_err();
        assert!(matches!(err, TtsError::UnknownSpeaker { lang: Lang::En, .. }));
    }

    #[tokio::test]
    async fn test_unloaded_language_rejected() {
        let engine = Arc::new(MockEngine::new(1000));
        let (service, _dir) = service_with(Arc::clone(&engine));

        let mut req = request("Hola.");
        req.lang = Lang::Es;
        let err = service.generate(req).await.unwrap_err();
        assert!(matches!(err, TtsError::EngineUnavailable { lang: Lang::Es }));
    }

    #[tokio::test]
    async fn test_emphasis_markup_stripped_before_render() {
        let engine = Arc::new(MockEngine::new(500));
        let (service, _dir) = service_with(Arc::clone(&engine));

        service.generate(request("*Hello* there.")).await.unwrap();
        let rendered = engine.recorded();
        assert!(!rendered[0].text.contains('*'), "got {:?}", rendered[0].text);
    }

    #[tokio::test]
    async fn test_ssml_wrapped_and_never_split() {
        let engine = Arc::new(MockEngine::new(500));
        let (service, _dir) = service_with(Arc::clone(&engine));

        // Far over the char limit: SSML must still go through in one call.
        let mut req = request(&format!("Hello <break time=\"1s\"/> {}", "word ".repeat(400)));
        req.use_ssml = true;
        service.generate(req).await.unwrap();

        let rendered = engine.recorded();
        assert_eq!(engine.call_count(), 1);
        assert!(rendered[0].ssml);
        assert!(rendered[0].text.starts_with("<speak>"));
        assert!(rendered[0].text.ends_with("</speak>"));
    }

    #[tokio::test]
    async fn test_ssml_not_double_wrapped() {
        let engine = Arc::new(MockEngine::new(500));
        let (service, _dir) = service_with(Arc::clone(&engine));

        let mut req = request("<speak>Hi there.</speak>");
        req.use_ssml = true;
        service.generate(req).await.unwrap();

        let rendered = engine.recorded();
        assert!(!rendered[0].text.starts_with("<speak><speak>"));
    }

    #[tokio::test]
    async fn test_session_persists_one_file_per_call() {
        let engine = Arc::new(MockEngine::new(200));
        let (service, dir) = service_with(Arc::clone(&engine));

        let mut req = request("Hello session.");
        req.session = "abc123".into();

        let first = service.generate(req.clone()).await.unwrap();
        let path = first.persisted.expect("session generation returns a path");
        assert!(path.exists());
        assert!(path.starts_with(dir.path().join("abc123")));

        service.generate(req).await.unwrap();
        let count = std::fs::read_dir(dir.path().join("abc123")).unwrap().count();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_numbers_spoken_in_english_text() {
        let engine = Arc::new(MockEngine::new(200));
        let (service, _dir) = service_with(Arc::clone(&engine));

        service.generate(request("It costs $5 for 2 items.")).await.unwrap();
        let rendered = engine.recorded();
        assert_eq!(rendered[0].text, "It costs five dollars for two items.");
    }

    #[test]
    fn test_wrap_ssml() {
        assert_eq!(wrap_ssml("hi".into()), "<speak>hi</speak>");
        assert_eq!(wrap_ssml("<speak>hi</speak>".into()), "<speak>hi</speak>");
    }
}
