use crate::modules::generation::domain::{
    Backdrop, GeneratedImage, ImageData, ProcessingStatus,
};
use serde::Serialize;
use uuid::Uuid;

/// One "regenerate" request and its progress
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationQueueItem {
    pub id: String,
    pub source_image: GeneratedImage,
    pub status: ProcessingStatus,
    /// Fresh background removal of the source product, fashion only
    pub new_transparent: Option<ImageData>,
    pub result: Option<GeneratedImage>,
    pub error_message: Option<String>,
}

impl RegenerationQueueItem {
    pub fn new(source_image: GeneratedImage) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source_image,
            status: ProcessingStatus::Pending,
            new_transparent: None,
            result: None,
            error_message: None,
        }
    }
}

/// Settings read at the start of every item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenerationPolicy {
    pub skip_bg_removal: bool,
    pub backdrop: Backdrop,
    pub auto_save: bool,
}

impl Default for RegenerationPolicy {
    fn default() -> Self {
        Self {
            skip_bg_removal: false,
            backdrop: Backdrop::Transparent,
            auto_save: true,
        }
    }
}
