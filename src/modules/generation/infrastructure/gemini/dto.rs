//! Wire types for the `generateContent` and `predict` endpoints.

use crate::modules::generation::domain::ImageData;
use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn image(image: &ImageData) -> AppResult<Self> {
        let (mime_type, data) = image.parts()?;
        Ok(Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            }),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GenerationConfig {
    pub fn image(seed: Option<u64>) -> Self {
        Self {
            response_modalities: Some(vec!["IMAGE".to_string()]),
            seed,
            ..Default::default()
        }
    }

    pub fn json() -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    pub fn new(parts: Vec<Part>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content { parts }],
            generation_config,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// First inline image of the first candidate, or the most specific
    /// reason why there is none
    pub fn into_image(self, empty_message: &str) -> AppResult<ImageData> {
        let candidate = self.candidates.into_iter().next();

        if let Some(content) = candidate.as_ref().and_then(|c| c.content.as_ref()) {
            if let Some(inline) = content.parts.iter().find_map(|p| p.inline_data.as_ref()) {
                return Ok(ImageData::from_base64(&inline.mime_type, &inline.data));
            }
        }

        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AppError::GenerationError(format!(
                "Blocked for safety reasons: {}",
                reason
            )));
        }

        match candidate.and_then(|c| c.finish_reason) {
            Some(reason) if reason == "NO_IMAGE" => Err(AppError::GenerationError(
                "The model could not produce an image for this request. Try a different image or prompt."
                    .to_string(),
            )),
            Some(reason) if reason != "STOP" => Err(AppError::GenerationError(format!(
                "Generation finished with reason: {}",
                reason
            ))),
            _ => Err(AppError::GenerationError(empty_message.to_string())),
        }
    }

    /// Concatenated text parts of the first candidate
    pub fn into_text(self) -> AppResult<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::ValidationError(
                "The model returned an empty response".to_string(),
            ));
        }
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictInstance {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutputOptions {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictParameters {
    pub sample_count: u32,
    pub aspect_ratio: String,
    pub output_options: OutputOptions,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictRequest {
    pub instances: Vec<PredictInstance>,
    pub parameters: PredictParameters,
}

impl PredictRequest {
    pub fn single_png(prompt: &str, aspect_ratio: &str) -> Self {
        Self {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: aspect_ratio.to_string(),
                output_options: OutputOptions {
                    mime_type: "image/png".to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

impl PredictResponse {
    pub fn into_image(self) -> AppResult<ImageData> {
        self.predictions
            .into_iter()
            .find_map(|p| {
                p.bytes_base64_encoded.map(|bytes| {
                    ImageData::from_base64(p.mime_type.as_deref().unwrap_or("image/png"), &bytes)
                })
            })
            .ok_or_else(|| AppError::GenerationError("The API returned no image.".to_string()))
    }
}

/// `{"error": {"code": 429, "message": "...", "status": "RESOURCE_EXHAUSTED"}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_image_part_is_extracted() {
        let response = parse(json!({
            "candidates": [{
                "content": {"parts": [{"text": "here"}, {"inlineData": {"mimeType": "image/png", "data": "AAAA"}}]},
                "finishReason": "STOP"
            }]
        }));
        let image = response.into_image("none").unwrap();
        assert_eq!(image.as_str(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_block_reason_wins_over_finish_reason() {
        let response = parse(json!({
            "candidates": [{"finishReason": "SAFETY"}],
            "promptFeedback": {"blockReason": "PROHIBITED_CONTENT"}
        }));
        let err = response.into_image("none").unwrap_err();
        assert_eq!(
            err,
            AppError::GenerationError("Blocked for safety reasons: PROHIBITED_CONTENT".into())
        );
    }

    #[test]
    fn test_finish_reasons() {
        let no_image = parse(json!({"candidates": [{"finishReason": "NO_IMAGE"}]}));
        assert!(matches!(no_image.into_image("none"), Err(AppError::GenerationError(m)) if m.contains("could not produce")));

        let other = parse(json!({"candidates": [{"finishReason": "RECITATION"}]}));
        assert_eq!(
            other.into_image("none").unwrap_err(),
            AppError::GenerationError("Generation finished with reason: RECITATION".into())
        );

        let stop = parse(json!({"candidates": [{"finishReason": "STOP"}]}));
        assert_eq!(
            stop.into_image("no image returned").unwrap_err(),
            AppError::GenerationError("no image returned".into())
        );
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateContentRequest::new(
            vec![Part::text("hi"), Part::image(&ImageData::blank_pixel()).unwrap()],
            GenerationConfig::image(Some(7)),
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["generationConfig"]["responseModalities"][0], "IMAGE");
        assert_eq!(value["generationConfig"]["seed"], 7);
        assert_eq!(value["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert!(value["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_predict_response_without_bytes_fails() {
        let response: PredictResponse = serde_json::from_value(json!({"predictions": [{}]})).unwrap();
        assert!(matches!(response.into_image(), Err(AppError::GenerationError(_))));
    }
}
