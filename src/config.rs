//! Service configuration and CLI argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::registry::Lang;

/// vocalis server configuration.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "vocalis-server")]
#[command(version, about = "Multi-language text-to-speech HTTP service", long_about = None)]
pub struct Config {
    /// Address to bind the HTTP listener on
    #[arg(long, env = "VOCALIS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP listener on
    #[arg(long, short = 'p', env = "VOCALIS_PORT", default_value = "8001")]
    pub port: u16,

    /// Languages to load voice models for
    #[arg(
        long,
        env = "VOCALIS_LANGUAGES",
        value_delimiter = ',',
        default_values_t = [Lang::En, Lang::Es, Lang::Ua]
    )]
    pub languages: Vec<Lang>,

    /// Directory downloaded voice models are cached in
    #[arg(long, env = "VOCALIS_MODEL_DIR", default_value = "models")]
    pub model_dir: PathBuf,

    /// Directory session-grouped clips are stored under
    #[arg(long, env = "VOCALIS_SESSIONS_DIR", default_value = "sessions")]
    pub sessions_dir: PathBuf,

    /// Maximum characters per synthesis call before text is split
    #[arg(long, default_value = "1000")]
    pub char_limit: usize,

    /// Per-request generation timeout in seconds
    #[arg(long, default_value = "120")]
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment() {
        let config = Config::parse_from(["vocalis-server"]);
        assert_eq!(config.port, 8001);
        assert_eq!(config.languages, vec![Lang::En, Lang::Es, Lang::Ua]);
        assert_eq!(config.char_limit, 1000);
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert_eq!(config.sessions_dir, PathBuf::from("sessions"));
    }

    #[test]
    fn test_language_list_parses() {
        let config = Config::parse_from(["vocalis-server", "--languages", "en,ua"]);
        assert_eq!(config.languages, vec![Lang::En, Lang::Ua]);
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::parse_from(["vocalis-server", "--host", "127.0.0.1", "-p", "9000"]);
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }
}
