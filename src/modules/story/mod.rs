/// Storyboard generation from analyzed scenes
pub mod domain;
pub mod sequencer;

pub use domain::{StoryOptions, StoryOutcome, StoryScene};
pub use sequencer::StorySequencer;
