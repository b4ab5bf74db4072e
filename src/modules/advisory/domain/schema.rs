//! Shapes the advisory model must return, checked right after parsing.
//!
//! The model is asked for JSON but nothing guarantees it complies, so every
//! response goes through one of the `validate_*` functions before use.

use crate::modules::generation::domain::ImageData;
use crate::shared::errors::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("expected a JSON array, got {0}")]
    NotAnArray(String),
    #[error("the model returned an empty list")]
    Empty,
    #[error("expected {expected} entries, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("entry {index} is malformed: {reason}")]
    MalformedEntry { index: usize, reason: String },
}

impl From<SchemaViolation> for AppError {
    fn from(violation: SchemaViolation) -> Self {
        AppError::ValidationError(format!("Unexpected model response: {}", violation))
    }
}

/// English text for the image model plus a Vietnamese reading for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilingualText {
    pub en: String,
    pub vi: String,
}

pub type PromptSuggestion = BilingualText;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSuggestion {
    pub scene: String,
    pub start_prompt: BilingualText,
    pub end_prompt: BilingualText,
}

/// One storyboard scene handed to the video-prompt call
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSceneInput {
    pub description: String,
    pub start_image: ImageData,
    pub end_image: ImageData,
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
    .to_string()
}

fn non_empty_array(value: Value) -> Result<Vec<Value>, SchemaViolation> {
    match value {
        Value::Array(items) if items.is_empty() => Err(SchemaViolation::Empty),
        Value::Array(items) => Ok(items),
        other => Err(SchemaViolation::NotAnArray(describe(&other))),
    }
}

fn typed_entries<T>(items: Vec<Value>) -> Result<Vec<T>, SchemaViolation>
where
    T: serde::de::DeserializeOwned,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| SchemaViolation::MalformedEntry {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Non-empty array of `{en, vi}` objects
pub fn validate_prompt_suggestions(value: Value) -> Result<Vec<PromptSuggestion>, SchemaViolation> {
    typed_entries(non_empty_array(value)?)
}

/// Non-empty array of strings
pub fn validate_string_list(value: Value) -> Result<Vec<String>, SchemaViolation> {
    typed_entries(non_empty_array(value)?)
}

/// Non-empty array of `{scene, startPrompt{en,vi}, endPrompt{en,vi}}`
pub fn validate_scene_suggestions(value: Value) -> Result<Vec<SceneSuggestion>, SchemaViolation> {
    typed_entries(non_empty_array(value)?)
}

/// Array of exactly `expected` strings
pub fn validate_video_prompts(
    value: Value,
    expected: usize,
) -> Result<Vec<String>, SchemaViolation> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(SchemaViolation::NotAnArray(describe(&other))),
    };
    if items.len() != expected {
        return Err(SchemaViolation::WrongLength {
            expected,
            actual: items.len(),
        });
    }
    typed_entries(items)
}
