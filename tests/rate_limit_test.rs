/// Credential cooldown and retry behaviour of the batch orchestrator
mod utils;

use scene_forge_lib::modules::credentials::{Credential, CredentialPool, RateLimitTracker};
use scene_forge_lib::modules::generation::application::{SceneGenerationProcessor, SceneSettings};
use scene_forge_lib::modules::generation::domain::{
    AspectRatio, Backdrop, CreativeMode, ProcessingStatus,
};
use scene_forge_lib::modules::jobs::{
    BatchOrchestrator, OrchestratorSettings, ProgressTracker, StopSignal,
};
use scene_forge_lib::modules::studio::{ActivityLog, Gallery, ProductCatalog, Viewer};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use utils::factories::{character_image, product_image, product_images};
use utils::fake_generator::{rate_limited, CallKind, FakeGenerator};

const COOLDOWN: Duration = Duration::from_secs(61);

struct Harness {
    generator: Arc<FakeGenerator>,
    products: ProductCatalog,
    gallery: Gallery,
    rate_limits: RateLimitTracker,
    orchestrator: BatchOrchestrator,
    processor: SceneGenerationProcessor,
}

fn settings(variants: usize) -> SceneSettings {
    SceneSettings {
        mode: CreativeMode::Fashion,
        base_prompt: "Base.".to_string(),
        negative_prompt: String::new(),
        bg_removal_prompt: String::new(),
        background_reference: "a quiet park".to_string(),
        pose_reference: String::new(),
        style_reference: String::new(),
        product_usage_reference: String::new(),
        background_image: None,
        character_image: character_image(),
        aspect_ratio: AspectRatio::Tall,
        variants,
        seed: 1,
        skip_bg_removal: true,
        backdrop: Backdrop::Transparent,
        auto_save: true,
    }
}

fn harness(generator: FakeGenerator, keys: &[&str], variants: usize) -> Harness {
    let generator = Arc::new(generator);
    let products = ProductCatalog::new();
    let gallery = Gallery::new();
    let activity = ActivityLog::new();
    let progress = ProgressTracker::new();
    let stop = StopSignal::new();
    let rate_limits = RateLimitTracker::new();

    let orchestrator = BatchOrchestrator::new(
        CredentialPool::from_keys(keys.iter().copied()),
        rate_limits.clone(),
        progress.clone(),
        stop.clone(),
        activity.clone(),
        OrchestratorSettings {
            cooldown: COOLDOWN,
            ..OrchestratorSettings::default()
        },
    );
    let processor = SceneGenerationProcessor::new(
        generator.clone(),
        settings(variants),
        products.clone(),
        gallery.clone(),
        Viewer::new(),
        activity,
        progress,
        stop,
    );

    Harness {
        generator,
        products,
        gallery,
        rate_limits,
        orchestrator,
        processor,
    }
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_job_retried_after_cooldown() {
    let generator = FakeGenerator::new().failing_when(|call, attempt| {
        (call.kind == CallKind::Scene && attempt == 0).then(rate_limited)
    });
    let h = harness(generator, &["k1"], 1);
    h.products.add(product_images(1)).await;
    let started = Instant::now();

    let outcome = h
        .orchestrator
        .run_batch(h.products.jobs().await, 1, 1, &h.processor)
        .await
        .unwrap();

    assert_eq!(outcome.rate_limit_retries, 1);
    assert_eq!(outcome.progress.completed, 1);
    assert_eq!(outcome.progress.errors, 0);

    let calls = h.generator.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].input, calls[1].input);
    let rejected_at = calls[0].finished_at.unwrap();
    assert!(calls[1].started_at >= rejected_at + COOLDOWN);
    assert!(started.elapsed() >= COOLDOWN);
    assert_eq!(h.gallery.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_resumes_at_undelivered_variant() {
    // variant 2 is rejected once; variant 1 must not be generated again
    let generator = FakeGenerator::new().failing_when(|call, attempt| {
        (call.kind == CallKind::Scene && attempt == 1).then(rate_limited)
    });
    let h = harness(generator, &["k1"], 3);
    h.products.add(product_images(1)).await;

    let outcome = h
        .orchestrator
        .run_batch(h.products.jobs().await, 3, 1, &h.processor)
        .await
        .unwrap();

    assert_eq!(outcome.progress.completed, 3);
    assert_eq!(outcome.progress.errors, 0);
    let seeds: Vec<_> = h
        .generator
        .calls_of(CallKind::Scene)
        .iter()
        .map(|call| call.seed)
        .collect();
    assert_eq!(seeds, vec![Some(1), Some(2), Some(2), Some(3)]);
    assert_eq!(h.gallery.len().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_blocked_key_sits_out_while_other_key_drains_queue() {
    let second = product_image(2);
    let generator = FakeGenerator::new().failing_when(move |call, attempt| {
        (call.kind == CallKind::Scene
            && call.credential == "k1"
            && call.input.as_ref() == Some(&second)
            && attempt == 0)
            .then(rate_limited)
    });
    let h = harness(generator, &["k1", "k2"], 1);
    let products = h.products.add(product_images(3)).await;

    let outcome = h
        .orchestrator
        .run_batch(h.products.jobs().await, 1, 1, &h.processor)
        .await
        .unwrap();

    assert_eq!(outcome.rate_limit_retries, 1);
    assert_eq!(outcome.progress.completed, 3);
    assert_eq!(outcome.progress.errors, 0);
    for product in &products {
        let stored = h.products.get(&product.id).await.unwrap();
        assert_eq!(stored.status, ProcessingStatus::Done);
    }

    let calls = h.generator.calls();
    let rejection = calls
        .iter()
        .find(|call| call.credential == "k1" && call.input == Some(product_image(2)))
        .unwrap();
    let rejected_at = rejection.finished_at.unwrap();
    assert!(calls
        .iter()
        .filter(|call| call.credential == "k1" && call.index > rejection.index)
        .all(|call| call.started_at >= rejected_at + COOLDOWN));

    let retried = calls
        .iter()
        .filter(|call| call.input == Some(product_image(2)))
        .last()
        .unwrap();
    assert_eq!(retried.credential, "k2");
    assert!(h
        .rate_limits
        .is_blocked(&Credential::new("k1"), Instant::now()));
    assert_eq!(h.gallery.len().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_every_key_blocked_waits_instead_of_failing() {
    let generator = FakeGenerator::new().failing_when(|call, attempt| {
        (call.kind == CallKind::Scene && attempt < 2).then(rate_limited)
    });
    let h = harness(generator, &["k1", "k2"], 1);
    h.products.add(product_images(1)).await;
    let started = Instant::now();

    let outcome = h
        .orchestrator
        .run_batch(h.products.jobs().await, 1, 1, &h.processor)
        .await
        .unwrap();

    assert_eq!(outcome.rate_limit_retries, 2);
    assert_eq!(outcome.progress.completed, 1);
    assert_eq!(outcome.progress.errors, 0);
    assert_eq!(h.generator.calls().len(), 3);
    assert!(started.elapsed() >= COOLDOWN);
}
