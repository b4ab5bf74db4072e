//! Embeddable image payloads (`data:<mime>;base64,<payload>`).

use crate::shared::errors::{AppError, AppResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 1x1 fully transparent PNG
const BLANK_PIXEL_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

static DATA_URL: OnceLock<Option<Regex>> = OnceLock::new();

fn data_url_pattern() -> Option<&'static Regex> {
    DATA_URL
        .get_or_init(|| Regex::new(r"^data:(image/[^;]+);base64,(.+)$").ok())
        .as_ref()
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageData(String);

impl ImageData {
    /// Accepts only well-formed image data URLs
    pub fn from_data_url(url: impl Into<String>) -> AppResult<Self> {
        let image = Self(url.into());
        image.parts()?;
        Ok(image)
    }

    pub fn from_base64(mime_type: &str, payload: &str) -> Self {
        Self(format!("data:{};base64,{}", mime_type, payload))
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self::from_base64(mime_type, &STANDARD.encode(bytes))
    }

    /// Transparent placeholder used when a call needs a subject image but
    /// the prompt carries all the content
    pub fn blank_pixel() -> Self {
        Self::from_base64("image/png", BLANK_PIXEL_PNG)
    }

    /// Split into `(mime type, base64 payload)`
    pub fn parts(&self) -> AppResult<(&str, &str)> {
        let pattern = data_url_pattern()
            .ok_or_else(|| AppError::InternalError("Data URL pattern unavailable".to_string()))?;
        let captures = pattern
            .captures(&self.0)
            .ok_or_else(|| AppError::ValidationError("Invalid image data URL".to_string()))?;
        match (captures.get(1), captures.get(2)) {
            (Some(mime), Some(data)) => Ok((mime.as_str(), data.as_str())),
            _ => Err(AppError::ValidationError(
                "Invalid image data URL".to_string(),
            )),
        }
    }

    pub fn mime_type(&self) -> AppResult<&str> {
        self.parts().map(|(mime, _)| mime)
    }

    pub fn decode(&self) -> AppResult<Vec<u8>> {
        let (_, payload) = self.parts()?;
        Ok(STANDARD.decode(payload)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mime = self.mime_type().unwrap_or("invalid");
        write!(f, "ImageData({}, {} bytes)", mime, self.0.len())
    }
}
