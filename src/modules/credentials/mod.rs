/// Credential management for the remote generation API
///
/// - Domain: the credential value and the shared pool
/// - Application: round-robin rotation for single-shot calls and the
///   per-credential cool-down table consulted by batch workers
pub mod application;
pub mod domain;

pub use application::{KeyRotation, RateLimitTracker, DEFAULT_RATE_LIMIT_COOLDOWN};
pub use domain::{Credential, CredentialPool};
