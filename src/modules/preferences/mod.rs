/// Saved user settings behind a swappable key-value store
pub mod domain;
pub mod service;
pub mod store;

pub use domain::UserPreferences;
pub use service::{PreferencesService, PREFERENCES_KEY};
pub use store::{FileKeyValueStore, InMemoryStore, KeyValueStore};
