pub mod client;
pub mod dto;
pub mod retry_policy;

pub use client::{classify_failure, GeminiClient, ADVISORY_MODEL, IMAGE_MODEL, TEXT_TO_IMAGE_MODEL};
pub use retry_policy::RetryPolicy;
