pub mod background_removal;
pub mod scene_pipeline;
pub mod single_shot;

pub use background_removal::BackgroundRemovalProcessor;
pub use scene_pipeline::{SceneGenerationProcessor, SceneSettings};
pub use single_shot::{NewBackgroundRequest, SingleShotService};
