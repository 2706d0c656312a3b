//! HTTP surface.
//!
//! Two endpoints, mirroring what frontends consume:
//! - `POST /tts/generate` — JSON request in, WAV bytes out, with `duration`,
//!   `md5` and `sha256` response headers describing the body.
//! - `GET /tts/speakers` — ordered `lang -> [{speaker_id, display_name}]`.
//!
//! CORS is fully permissive; the service is meant to sit behind whatever
//! frontend origin the deployment uses.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::TtsError;
use crate::registry::{Lang, SpeakerInfo};
use crate::service::{GenerateRequest, TtsService};

/// JSON body of `POST /tts/generate`.
#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    pub language: Lang,
    pub speaker: String,
    pub text: String,
    #[serde(default)]
    pub use_ssml: bool,
    #[serde(default)]
    pub session: String,
}

pub fn router(service: Arc<TtsService>) -> Router {
    Router::new()
        .route("/tts/generate", post(generate))
        .route("/tts/speakers", get(speakers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

async fn generate(
    State(service): State<Arc<TtsService>>,
    Json(request): Json<VoiceRequest>,
) -> Result<Response, TtsError> {
    let generated = service
        .generate(GenerateRequest {
            lang: request.language,
            speaker: request.speaker,
            text: request.text,
            use_ssml: request.use_ssml,
            session: request.session,
        })
        .await?;

    let body = generated.clip.wav_bytes()?;
    let (md5_hex, sha256_hex) = content_hashes(&body);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    headers.insert("duration", HeaderValue::from(generated.clip.duration_ms()));
    // Hex digests are always valid header values.
    headers.insert("md5", HeaderValue::try_from(md5_hex).expect("hex digest header"));
    headers.insert("sha256", HeaderValue::try_from(sha256_hex).expect("hex digest header"));

    Ok((headers, body).into_response())
}

async fn speakers(
    State(service): State<Arc<TtsService>>,
) -> Json<BTreeMap<Lang, Vec<SpeakerInfo>>> {
    Json(service.registry().speakers())
}

/// md5 and sha256 hex digests of the response body.
fn content_hashes(bytes: &[u8]) -> (String, String) {
    let md5_hex = format!("{:x}", md5::compute(bytes));
    let sha256_hex = format!("{:x}", Sha256::digest(bytes));
    (md5_hex, sha256_hex)
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let status = match &self {
            TtsError::EmptyText | TtsError::InvalidSession { .. } => StatusCode::BAD_REQUEST,
            TtsError::EngineUnavailable { .. } | TtsError::UnknownSpeaker { .. } => {
                StatusCode::NOT_FOUND
            }
            TtsError::UnsplittableUnit { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TtsError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            TtsError::Render(_) | TtsError::Wav(_) | TtsError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!("Request failed: {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::audio::AudioClip;
    use crate::engine::{RenderRequest, SynthesisEngine, SAMPLE_RATE};
    use crate::error::Result as TtsResult;
    use crate::registry::EngineRegistry;
    use crate::session::SessionStore;

    struct FixedEngine {
        speakers: Vec<String>,
    }

    impl SynthesisEngine for FixedEngine {
        fn speakers(&self) -> &[String] {
            &self.speakers
        }

        fn synthesize(&self, _request: &RenderRequest) -> TtsResult<AudioClip> {
            Ok(AudioClip::silence(SAMPLE_RATE, 250))
        }
    }

    fn test_router() -> (Router, tempfile::TempDir) {
        let sessions = tempfile::tempdir().unwrap();
        let registry = EngineRegistry::from_engines([(
            Lang::En,
            Arc::new(FixedEngine { speakers: vec!["en_0".into()] })
                as Arc<dyn SynthesisEngine>,
        )]);
        let service = Arc::new(TtsService::new(
            Arc::new(registry),
            SessionStore::new(sessions.path()),
            1000,
            Duration::from_secs(10),
        ));
        (router(service), sessions)
    }

    fn generate_body(json: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/tts/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_wav_with_hash_headers() {
        let (app, _dir) = test_router();
        let response = app
            .oneshot(generate_body(serde_json::json!({
                "language": "en",
                "speaker": "en_0",
                "text": "Hello over HTTP."
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
        assert_eq!(response.headers()["duration"], "250");

        let md5_header = response.headers()["md5"].to_str().unwrap().to_string();
        let sha_header = response.headers()["sha256"].to_str().unwrap().to_string();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        assert_eq!(&body[..4], b"RIFF");
        let (md5_hex, sha256_hex) = content_hashes(&body);
        assert_eq!(md5_header, md5_hex);
        assert_eq!(sha_header, sha256_hex);
    }

    #[tokio::test]
    async fn test_generate_unknown_language_is_404() {
        let (app, _dir) = test_router();
        let response = app
            .oneshot(generate_body(serde_json::json!({
                "language": "ua",
                "speaker": "ua_0",
                "text": "Привіт."
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_empty_text_is_400() {
        let (app, _dir) = test_router();
        let response = app
            .oneshot(generate_body(serde_json::json!({
                "language": "en",
                "speaker": "en_0",
                "text": "  "
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_speakers_listing_shape() {
        let (app, _dir) = test_router();
        let response = app
            .oneshot(
                Request::builder().uri("/tts/speakers").body(Body::empty()).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let listing: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(listing["en"][0]["speaker_id"], "en_0");
        assert_eq!(listing["en"][0]["display_name"], "en_0");
    }

    #[test]
    fn test_unsplittable_maps_to_422() {
        let err = TtsError::UnsplittableUnit { word: "x".into(), len: 2000, limit: 1000 };
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_timeout_maps_to_504() {
        let err = TtsError::Timeout(Duration::from_secs(5));
        assert_eq!(err.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
