/// Regeneration queue consumed by the single background worker
mod utils;

use scene_forge_lib::modules::generation::domain::{
    Backdrop, GeneratedImage, GenerationType, ImageData, ProcessingStatus,
};
use scene_forge_lib::modules::studio::BatchRequest;
use scene_forge_lib::shared::errors::AppError;
use scene_forge_lib::StudioService;
use std::time::Duration;
use utils::factories::{batch_request, character_image, preferences, product_image};
use utils::fake_generator::{generation_failed, CallKind, FakeGenerator};
use utils::helpers::build_studio;

fn tti_image(n: usize) -> GeneratedImage {
    GeneratedImage::new(
        ImageData::from_bytes("image/png", format!("tti-{}", n).as_bytes()),
        GenerationType::Tti,
        format!("prompt {}", n),
    )
}

async fn wait_until_settled(studio: &StudioService) {
    for _ in 0..1_000 {
        let items = studio.regeneration_queue().list().await;
        if items.iter().all(|item| item.status.is_terminal()) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("regeneration queue did not settle");
}

#[tokio::test(start_paused = true)]
async fn test_queued_items_run_one_at_a_time_oldest_first() {
    let generator = FakeGenerator::new().with_delay(Duration::from_millis(50));
    let ctx = build_studio(generator, preferences(&["k1"], 4)).await;

    let mut ids = Vec::new();
    for n in 1..=3 {
        let image = tti_image(n);
        ids.push(image.id.clone());
        ctx.studio.gallery().prepend(image).await;
    }
    for id in &ids {
        ctx.studio.request_regeneration(id).await.unwrap();
    }
    assert!(ctx.studio.gallery().is_empty().await);

    ctx.studio.start_regeneration_worker().await;
    wait_until_settled(&ctx.studio).await;
    ctx.studio.stop_regeneration_worker().await;

    let calls = ctx.generator.calls_of(CallKind::TextToImage);
    assert_eq!(calls.len(), 3);
    assert_eq!(ctx.generator.max_in_flight(), 1);
    for pair in calls.windows(2) {
        assert!(pair[1].started_at >= pair[0].finished_at.unwrap());
    }
    assert!(calls[0].instruction.starts_with("prompt 1,"));
    assert!(calls[2].instruction.starts_with("prompt 3,"));

    let items = ctx.studio.regeneration_queue().list().await;
    assert!(items
        .iter()
        .all(|item| item.status == ProcessingStatus::Done && item.result.is_some()));
    assert_eq!(ctx.studio.gallery().len().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_item_added_while_worker_idle_is_picked_up() {
    let ctx = build_studio(FakeGenerator::new(), preferences(&["k1"], 1)).await;
    ctx.studio.start_regeneration_worker().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let image = tti_image(1);
    let id = image.id.clone();
    ctx.studio.gallery().prepend(image).await;
    ctx.studio.request_regeneration(&id).await.unwrap();

    wait_until_settled(&ctx.studio).await;
    ctx.studio.stop_regeneration_worker().await;

    assert_eq!(ctx.generator.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_regeneration_marks_item_error() {
    let generator = FakeGenerator::new().failing_when(|_, _| Some(generation_failed()));
    let ctx = build_studio(generator, preferences(&["k1"], 1)).await;

    let image = tti_image(1);
    let id = image.id.clone();
    ctx.studio.gallery().prepend(image).await;
    let item = ctx.studio.request_regeneration(&id).await.unwrap();

    ctx.studio.start_regeneration_worker().await;
    wait_until_settled(&ctx.studio).await;
    ctx.studio.stop_regeneration_worker().await;

    let stored = ctx.studio.regeneration_queue().get(&item.id).await.unwrap();
    assert_eq!(stored.status, ProcessingStatus::Error);
    assert!(stored.error_message.is_some());
    assert!(ctx.studio.gallery().is_empty().await);

    let entries = ctx.studio.activity().entries().await;
    assert!(entries
        .iter()
        .any(|entry| entry.message.starts_with("Regeneration failed")));
}

#[tokio::test(start_paused = true)]
async fn test_fashion_regeneration_recomposes_original_product() {
    let ctx = build_studio(FakeGenerator::new(), preferences(&["k1"], 1)).await;

    let mut image = GeneratedImage::new(
        ImageData::from_bytes("image/png", b"scene"),
        GenerationType::Fashion,
        "Base.",
    );
    image.original_product = Some(product_image(1));
    image.character_image = Some(character_image());
    image.background_reference = "a rooftop bar".to_string();
    let id = image.id.clone();
    ctx.studio.gallery().prepend(image).await;
    let item = ctx.studio.request_regeneration(&id).await.unwrap();

    ctx.studio.start_regeneration_worker().await;
    wait_until_settled(&ctx.studio).await;
    ctx.studio.stop_regeneration_worker().await;

    // background removal is skipped by the test preferences
    let scenes = ctx.generator.calls_of(CallKind::Scene);
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].input, Some(product_image(1)));
    assert_eq!(scenes[0].character, Some(character_image()));
    assert!(scenes[0].instruction.contains("a rooftop bar"));

    let stored = ctx.studio.regeneration_queue().get(&item.id).await.unwrap();
    let result = stored.result.unwrap();
    assert_ne!(result.id, id);
    assert_eq!(result.generation_type, GenerationType::Fashion);
    assert_eq!(result.background_reference, "a rooftop bar");
}

#[tokio::test(start_paused = true)]
async fn test_regeneration_reuses_backdrop_of_latest_batch() {
    let mut prefs = preferences(&["k1"], 1);
    prefs.skip_bg_removal = false;
    let ctx = build_studio(FakeGenerator::new(), prefs).await;
    ctx.studio.add_products(vec![product_image(1)]).await;

    let request = BatchRequest {
        backdrop: Backdrop::Gray,
        ..batch_request(1, 7)
    };
    let report = ctx.studio.generate_batch(request).await.unwrap();
    let id = report.images[0].id.clone();
    ctx.studio.request_regeneration(&id).await.unwrap();

    ctx.studio.start_regeneration_worker().await;
    wait_until_settled(&ctx.studio).await;
    ctx.studio.stop_regeneration_worker().await;

    let removals = ctx.generator.calls_of(CallKind::RemoveBackground);
    assert_eq!(removals.len(), 2);
    assert!(removals
        .iter()
        .all(|call| call.instruction.ends_with("on a gray background.")));
    assert_eq!(removals[1].input, Some(product_image(1)));
}

#[tokio::test]
async fn test_unknown_image_cannot_be_queued() {
    let ctx = build_studio(FakeGenerator::new(), preferences(&["k1"], 1)).await;

    let result = ctx.studio.request_regeneration("missing").await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(ctx.studio.regeneration_queue().list().await.is_empty());
}
