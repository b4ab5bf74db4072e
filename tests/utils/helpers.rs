/// Service builders for integration tests
use super::fake_advisor::CannedAdvisor;
use super::fake_generator::FakeGenerator;
use scene_forge_lib::modules::preferences::{InMemoryStore, UserPreferences};
use scene_forge_lib::{AppConfig, StudioService};
use serde_json::json;
use std::sync::Arc;

pub struct TestStudio {
    pub studio: StudioService,
    pub generator: Arc<FakeGenerator>,
    pub advisor: Arc<CannedAdvisor>,
}

/// Studio over the fake backends with `preferences` already applied
pub async fn build_studio(generator: FakeGenerator, preferences: UserPreferences) -> TestStudio {
    build_studio_with_config(AppConfig::default(), generator, preferences).await
}

pub async fn build_studio_with_config(
    config: AppConfig,
    generator: FakeGenerator,
    preferences: UserPreferences,
) -> TestStudio {
    let generator = Arc::new(generator);
    let advisor = Arc::new(CannedAdvisor::new(json!([])));
    let studio = StudioService::new(
        config,
        generator.clone(),
        advisor.clone(),
        Arc::new(InMemoryStore::new()),
    );
    studio
        .save_preferences(preferences)
        .await
        .expect("in-memory preferences save");

    TestStudio {
        studio,
        generator,
        advisor,
    }
}
