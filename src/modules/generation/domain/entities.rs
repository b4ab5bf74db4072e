/// Domain entities for image generation
///
/// Products move through a status pipeline as their background is removed
/// and scenes are composed; every delivered image carries the inputs needed
/// to regenerate it.
use super::image::ImageData;
use crate::modules::jobs::BatchJob;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline status shared by products and regeneration items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingStatus {
    Pending,
    ProcessingBg,
    BgRemoved,
    ProcessingScene,
    Done,
    Error,
}

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStatus::Done | ProcessingStatus::Error)
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStatus::Pending => write!(f, "pending"),
            ProcessingStatus::ProcessingBg => write!(f, "processing-bg"),
            ProcessingStatus::BgRemoved => write!(f, "bg-removed"),
            ProcessingStatus::ProcessingScene => write!(f, "processing-scene"),
            ProcessingStatus::Done => write!(f, "done"),
            ProcessingStatus::Error => write!(f, "error"),
        }
    }
}

/// How an image was produced; decides the regeneration path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationType {
    Fashion,
    Edit,
    Tti,
}

impl std::fmt::Display for GenerationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationType::Fashion => write!(f, "fashion"),
            GenerationType::Edit => write!(f, "edit"),
            GenerationType::Tti => write!(f, "tti"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[default]
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "16:9")]
    Wide,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Tall => "9:16",
            AspectRatio::Wide => "16:9",
        }
    }

    /// Orientation phrase used inside prompt templates
    pub fn orientation(&self) -> &'static str {
        match self {
            AspectRatio::Square => "square",
            AspectRatio::Portrait | AspectRatio::Tall => "tall, vertical",
            AspectRatio::Landscape | AspectRatio::Wide => "wide, horizontal",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1:1" => Ok(AspectRatio::Square),
            "3:4" => Ok(AspectRatio::Portrait),
            "4:3" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Tall),
            "16:9" => Ok(AspectRatio::Wide),
            _ => Err(format!("Invalid aspect ratio: {}", s)),
        }
    }
}

/// Fashion shots dress the character in the product; custom shots have the
/// character use or hold it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreativeMode {
    #[default]
    Fashion,
    Custom,
}

/// Solid backdrop requested from background removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backdrop {
    #[default]
    Transparent,
    White,
    Black,
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    Start,
    End,
}

/// A delivered image together with everything used to produce it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub id: String,
    pub image: ImageData,
    pub transparent_product: Option<ImageData>,
    pub original_product: Option<ImageData>,
    pub character_image: Option<ImageData>,
    pub prompt: String,
    pub negative_prompt: String,
    pub bg_removal_prompt: String,
    pub background_reference: String,
    pub pose_reference: String,
    pub style_reference: String,
    pub background_reference_image: Option<ImageData>,
    pub generation_type: GenerationType,
    pub aspect_ratio: Option<AspectRatio>,
    pub scene_index: Option<usize>,
    pub frame_type: Option<FrameType>,
    pub source_product_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn new(image: ImageData, generation_type: GenerationType, prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image,
            transparent_product: None,
            original_product: None,
            character_image: None,
            prompt: prompt.into(),
            negative_prompt: String::new(),
            bg_removal_prompt: String::new(),
            background_reference: String::new(),
            pose_reference: String::new(),
            style_reference: String::new(),
            background_reference_image: None,
            generation_type,
            aspect_ratio: None,
            scene_index: None,
            frame_type: None,
            source_product_id: None,
            created_at: Utc::now(),
        }
    }

    /// Same provenance, new identity and output
    pub fn derive(&self, image: ImageData) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image,
            created_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// An uploaded product photo and its derived images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImageFile {
    pub id: String,
    pub original: ImageData,
    pub status: ProcessingStatus,
    pub transparent: Option<ImageData>,
    pub generated_preview: Option<ImageData>,
    pub error_message: Option<String>,
}

impl ProductImageFile {
    pub fn new(original: ImageData) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            original,
            status: ProcessingStatus::Pending,
            transparent: None,
            generated_preview: None,
            error_message: None,
        }
    }

    pub fn to_job(&self) -> ProductJob {
        ProductJob {
            id: self.id.clone(),
            original: self.original.clone(),
        }
    }
}

/// Minimal payload a batch worker needs to process one product
#[derive(Debug, Clone, PartialEq)]
pub struct ProductJob {
    pub id: String,
    pub original: ImageData,
}

impl BatchJob for ProductJob {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&ProcessingStatus::ProcessingBg).unwrap();
        assert_eq!(json, "\"processing-bg\"");
        assert_eq!(ProcessingStatus::BgRemoved.to_string(), "bg-removed");
    }

    #[test]
    fn test_aspect_ratio_round_trip_through_str() {
        for ratio in ["1:1", "3:4", "4:3", "9:16", "16:9"] {
            let parsed: AspectRatio = ratio.parse().unwrap();
            assert_eq!(parsed.as_str(), ratio);
        }
        assert!("2:1".parse::<AspectRatio>().is_err());
        assert_eq!(AspectRatio::default(), AspectRatio::Tall);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ProcessingStatus::Done.is_terminal());
        assert!(ProcessingStatus::Error.is_terminal());
        assert!(!ProcessingStatus::BgRemoved.is_terminal());
    }

    #[test]
    fn test_product_job_keeps_identity() {
        let product = ProductImageFile::new(ImageData::blank_pixel());
        let job = product.to_job();
        assert_eq!(job.id(), product.id);
    }
}
