pub mod advisory;
pub mod credentials;
pub mod generation;
pub mod jobs;
pub mod media;
pub mod preferences;
pub mod regeneration;
pub mod story;
pub mod studio;
