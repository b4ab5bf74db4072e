/// Test data with sensible defaults
use scene_forge_lib::modules::advisory::BilingualText;
use scene_forge_lib::modules::generation::domain::{Backdrop, CreativeMode, ImageData};
use scene_forge_lib::modules::preferences::UserPreferences;
use scene_forge_lib::modules::story::StoryScene;
use scene_forge_lib::modules::studio::BatchRequest;

pub fn product_image(n: usize) -> ImageData {
    ImageData::from_bytes("image/png", format!("product-{}", n).as_bytes())
}

pub fn product_images(count: usize) -> Vec<ImageData> {
    (1..=count).map(product_image).collect()
}

pub fn character_image() -> ImageData {
    ImageData::from_bytes("image/jpeg", b"character")
}

/// Own keys only, no background removal, gallery auto-save on
pub fn preferences(keys: &[&str], concurrency: usize) -> UserPreferences {
    UserPreferences {
        api_keys: keys.iter().map(|key| key.to_string()).collect(),
        use_default_api_key: false,
        max_concurrency: concurrency,
        skip_bg_removal: true,
        auto_save_to_gallery: true,
        ..UserPreferences::default()
    }
}

pub fn batch_request(variants: usize, seed: u64) -> BatchRequest {
    BatchRequest {
        mode: CreativeMode::Fashion,
        character_image: character_image(),
        background_image: None,
        variants,
        seed: Some(seed),
        backdrop: Backdrop::Transparent,
    }
}

pub fn story_scene(n: usize) -> StoryScene {
    StoryScene {
        scene: format!("Scene {}", n),
        start_prompt: BilingualText {
            en: format!("scene {} start", n),
            vi: format!("canh {} bat dau", n),
        },
        end_prompt: BilingualText {
            en: format!("scene {} end", n),
            vi: format!("canh {} ket thuc", n),
        },
    }
}
