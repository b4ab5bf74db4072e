use super::domain::UserPreferences;
use super::store::KeyValueStore;
use crate::modules::credentials::CredentialPool;
use crate::shared::errors::AppResult;
use crate::shared::utils::LogContext;
use crate::{log_debug, log_warn};
use std::sync::Arc;

pub const PREFERENCES_KEY: &str = "userPreferences";

pub struct PreferencesService {
    store: Arc<dyn KeyValueStore>,
}

impl PreferencesService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Saved preferences, or defaults when nothing usable is stored
    pub fn load(&self) -> UserPreferences {
        let raw = match self.store.get(PREFERENCES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log_debug!("No saved preferences, using defaults");
                return UserPreferences::default();
            }
            Err(e) => {
                LogContext::error_with_context(&e, "Failed to read preferences");
                return UserPreferences::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(preferences) => preferences,
            Err(e) => {
                log_warn!("Saved preferences are corrupt, using defaults: {}", e);
                UserPreferences::default()
            }
        }
    }

    pub fn save(&self, preferences: &UserPreferences) -> AppResult<()> {
        let raw = serde_json::to_string(preferences)?;
        self.store.set(PREFERENCES_KEY, &raw)
    }

    pub fn active_credentials(
        &self,
        preferences: &UserPreferences,
        defaults: &[String],
    ) -> CredentialPool {
        CredentialPool::from_keys(preferences.active_keys(defaults))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::preferences::store::{InMemoryStore, MockKeyValueStore};
    use crate::shared::errors::AppError;
    use mockall::predicate::eq;

    #[test]
    fn test_round_trip() {
        let service = PreferencesService::new(Arc::new(InMemoryStore::new()));
        let prefs = UserPreferences {
            max_concurrency: 5,
            api_keys: vec!["a".into()],
            ..Default::default()
        };

        service.save(&prefs).unwrap();
        assert_eq!(service.load(), prefs);
    }

    #[test]
    fn test_corrupt_value_falls_back_to_defaults() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .with(eq(PREFERENCES_KEY))
            .returning(|_| Ok(Some("{not json".to_string())));

        let service = PreferencesService::new(Arc::new(store));
        assert_eq!(service.load(), UserPreferences::default());
    }

    #[test]
    fn test_unreadable_store_falls_back_to_defaults() {
        let mut store = MockKeyValueStore::new();
        store
            .expect_get()
            .returning(|_| Err(AppError::StorageError("disk gone".into())));

        let service = PreferencesService::new(Arc::new(store));
        assert_eq!(service.load(), UserPreferences::default());
    }

    #[test]
    fn test_active_credentials_dedupe_user_keys() {
        let service = PreferencesService::new(Arc::new(InMemoryStore::new()));
        let prefs = UserPreferences {
            use_default_api_key: false,
            api_keys: vec!["a".into(), " a ".into(), "b".into()],
            ..Default::default()
        };
        assert_eq!(service.active_credentials(&prefs, &[]).len(), 2);
    }
}
