pub mod model;
pub mod prompts;
pub mod schema;

pub use model::AdvisoryModel;
pub use schema::{
    BilingualText, PromptSuggestion, SceneSuggestion, SchemaViolation, VideoSceneInput,
};
