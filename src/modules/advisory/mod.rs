/// Advisory text-model calls
///
/// Prompt suggestions, edit ideas, story breakdowns and video prompts. Every
/// response is checked against its expected shape before it is returned.
pub mod application;
pub mod domain;

pub use application::AdvisoryService;
pub use domain::{
    AdvisoryModel, BilingualText, PromptSuggestion, SceneSuggestion, SchemaViolation,
    VideoSceneInput,
};
