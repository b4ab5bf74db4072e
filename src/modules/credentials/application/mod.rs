pub mod key_rotation;
pub mod rate_limit_tracker;

pub use key_rotation::KeyRotation;
pub use rate_limit_tracker::{RateLimitTracker, DEFAULT_RATE_LIMIT_COOLDOWN};
