//! Model artifact cache.
//!
//! One file per language in the local model directory, named from the fixed
//! download URL's basename. A present file is treated as already downloaded;
//! no integrity check is made against the remote source.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

/// File name portion of a model URL.
fn url_basename(url: &str) -> Result<&str> {
    match url.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => bail!("Model URL '{url}' has no file name component"),
    }
}

/// Ensure the artifact at `url` is present under `model_dir`, downloading it
/// on first use. Returns the cached file path.
pub fn ensure_cached(model_dir: &Path, url: &str) -> Result<PathBuf> {
    let name = url_basename(url)?;
    let target = model_dir.join(name);
    if target.is_file() {
        return Ok(target);
    }

    fs::create_dir_all(model_dir)
        .with_context(|| format!("Cannot create model directory: {}", model_dir.display()))?;

    warn!("First run, downloading model from {url}. This could take some time...");
    let response = reqwest::blocking::get(url)
        .and_then(reqwest::blocking::Response::error_for_status)
        .with_context(|| format!("Failed to download '{url}'"))?;
    let bytes = response.bytes().with_context(|| format!("Failed to read body of '{url}'"))?;

    // Write to a temporary name, then rename: an interrupted download must
    // never leave a half-written file that would pass the presence check.
    let partial = model_dir.join(format!("{name}.part"));
    let staged = fs::write(&partial, &bytes).and_then(|()| fs::rename(&partial, &target));
    if let Err(err) = staged {
        let _ = fs::remove_file(&partial);
        return Err(err).with_context(|| format!("Cannot store model at {}", target.display()));
    }

    info!("Model download completed ({} bytes).", bytes.len());
    Ok(target)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_basename() {
        assert_eq!(url_basename("https://host/path/v3_en.onnx").unwrap(), "v3_en.onnx");
        assert!(url_basename("https://host/path/").is_err());
    }

    #[test]
    fn test_present_file_short_circuits() {
        // A cached file is returned as-is; the (unroutable) URL is never hit.
        let dir = tempfile::tempdir().unwrap();
        let cached = dir.path().join("v3_en.onnx");
        fs::write(&cached, b"model-bytes").unwrap();

        let path = ensure_cached(dir.path(), "http://192.0.2.1/models/v3_en.onnx").unwrap();
        assert_eq!(path, cached);
        assert_eq!(fs::read(&path).unwrap(), b"model-bytes");
    }
}
