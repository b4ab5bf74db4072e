use crate::modules::generation::domain::{AspectRatio, GeneratedImage};
use serde::Serialize;

pub use crate::modules::advisory::domain::SceneSuggestion as StoryScene;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryOptions {
    /// Condition every frame after the first on the previous frame's output
    pub keep_character_consistent: bool,
    pub aspect_ratio: AspectRatio,
    pub auto_save: bool,
}

impl Default for StoryOptions {
    fn default() -> Self {
        Self {
            keep_character_consistent: true,
            aspect_ratio: AspectRatio::Tall,
            auto_save: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryOutcome {
    /// Delivered frames in generation order
    pub frames: Vec<GeneratedImage>,
    /// 1-based scene whose frame failed and halted the run
    pub failed_scene: Option<usize>,
    pub stopped: bool,
}
