//! How a result is shown, and the copy/download actions that go with it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use tracing::info;

use crate::analysis::AnalysisResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderPlan<'a> {
    /// Grid with a download per variation and a bulk download
    ImageGrid(&'a [String]),
    /// One large preview with a download
    SingleImage(&'a str),
    /// Formatted text with copy-to-clipboard
    Document(&'a str),
}

impl<'a> RenderPlan<'a> {
    pub fn for_result(result: &'a AnalysisResult) -> Self {
        match result {
            AnalysisResult::Images(images) => RenderPlan::ImageGrid(images),
            AnalysisResult::Text(text) if is_image_payload(text) => RenderPlan::SingleImage(text),
            AnalysisResult::Text(text) => RenderPlan::Document(text),
        }
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            RenderPlan::ImageGrid(_) => "Download All",
            RenderPlan::SingleImage(_) => "Download Image",
            RenderPlan::Document(_) => "Copy Result",
        }
    }
}

pub fn is_image_payload(content: &str) -> bool {
    content.starts_with("data:image")
}

/// A decoded `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    pub fn extension(&self) -> &'static str {
        extension_for(&self.mime_type)
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

pub fn decode_data_uri(uri: &str) -> Result<DecodedImage> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data URI has no payload"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| anyhow!("only base64 data URIs are supported"))?;

    let bytes = general_purpose::STANDARD
        .decode(payload)
        .context("invalid base64 in data URI")?;

    Ok(DecodedImage {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// `innoguide-variation-<n>-<timestamp>.<ext>`, with `n` counted from 1.
pub fn download_file_name(index: usize, timestamp_ms: i64, extension: &str) -> String {
    format!("innoguide-variation-{}-{}.{}", index + 1, timestamp_ms, extension)
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Decode one data URI and write it into `dir`.
pub fn save_image(dir: &Path, uri: &str, index: usize, timestamp_ms: i64) -> Result<PathBuf> {
    let image = decode_data_uri(uri)?;
    fs::create_dir_all(dir)
        .with_context(|| format!("could not create {}", dir.display()))?;

    let path = dir.join(download_file_name(index, timestamp_ms, image.extension()));
    fs::write(&path, &image.bytes)
        .with_context(|| format!("could not write {}", path.display()))?;
    info!(path = %path.display(), "saved image");
    Ok(path)
}

/// Save every variation with a shared timestamp.
pub fn save_all(dir: &Path, uris: &[String], timestamp_ms: i64) -> Result<Vec<PathBuf>> {
    uris.iter()
        .enumerate()
        .map(|(index, uri)| save_image(dir, uri, index, timestamp_ms))
        .collect()
}
