use crate::modules::advisory::domain::prompts::DEFAULT_VIDEO_PROMPT_STRUCTURE;
use crate::modules::credentials::DEFAULT_RATE_LIMIT_COOLDOWN;
use crate::modules::generation::domain::{AspectRatio, CreativeMode};
use crate::modules::generation::prompts::templates::{base_prompt, DEFAULT_BG_REMOVAL_PROMPT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything remembered between sessions
///
/// Missing fields fall back to their defaults, so older saves keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub fashion_prompt: String,
    pub fashion_negative_prompt: String,
    pub fashion_bg_removal_prompt: String,
    pub fashion_background_reference: String,
    pub fashion_pose_reference: String,
    pub fashion_style_reference: String,
    pub fashion_aspect_ratio: AspectRatio,

    pub custom_prompt: String,
    pub custom_negative_prompt: String,
    pub custom_bg_removal_prompt: String,
    pub custom_background_reference: String,
    pub custom_pose_reference: String,
    pub custom_style_reference: String,
    pub custom_product_usage_reference: String,

    pub auto_save_to_gallery: bool,
    pub auto_download_all: bool,
    pub skip_bg_removal: bool,
    pub api_keys: Vec<String>,
    /// In-flight calls per API key during batch runs
    pub max_concurrency: usize,
    /// Use the keys from the environment instead of `api_keys`
    pub use_default_api_key: bool,
    pub video_prompt_structure: String,
    pub rate_limit_cooldown_secs: u64,
}

impl Default for UserPreferences {
    fn default() -> Self {
        let ratio = AspectRatio::default();
        Self {
            fashion_prompt: base_prompt(CreativeMode::Fashion, ratio),
            fashion_negative_prompt: String::new(),
            fashion_bg_removal_prompt: DEFAULT_BG_REMOVAL_PROMPT.to_string(),
            fashion_background_reference: String::new(),
            fashion_pose_reference: String::new(),
            fashion_style_reference: String::new(),
            fashion_aspect_ratio: ratio,

            custom_prompt: base_prompt(CreativeMode::Custom, ratio),
            custom_negative_prompt: String::new(),
            custom_bg_removal_prompt: DEFAULT_BG_REMOVAL_PROMPT.to_string(),
            custom_background_reference: String::new(),
            custom_pose_reference: String::new(),
            custom_style_reference: String::new(),
            custom_product_usage_reference: String::new(),

            auto_save_to_gallery: true,
            auto_download_all: false,
            skip_bg_removal: false,
            api_keys: Vec::new(),
            max_concurrency: 2,
            use_default_api_key: true,
            video_prompt_structure: DEFAULT_VIDEO_PROMPT_STRUCTURE.to_string(),
            rate_limit_cooldown_secs: DEFAULT_RATE_LIMIT_COOLDOWN.as_secs(),
        }
    }
}

impl UserPreferences {
    /// Built-in keys or the user's own, never a mix
    pub fn active_keys(&self, defaults: &[String]) -> Vec<String> {
        if self.use_default_api_key {
            defaults.to_vec()
        } else {
            self.api_keys.clone()
        }
    }

    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs.max(1))
    }

    pub fn concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"maxConcurrency": 4, "skipBgRemoval": true}"#).unwrap();
        assert_eq!(prefs.max_concurrency, 4);
        assert!(prefs.skip_bg_removal);
        assert!(prefs.auto_save_to_gallery);
        assert_eq!(prefs.fashion_aspect_ratio, AspectRatio::Tall);
        assert_eq!(prefs.rate_limit_cooldown_secs, 61);
    }

    #[test]
    fn test_active_keys_follow_toggle() {
        let defaults = vec!["env".to_string()];
        let mut prefs = UserPreferences {
            api_keys: vec!["mine".to_string()],
            ..Default::default()
        };
        assert_eq!(prefs.active_keys(&defaults), defaults);
        prefs.use_default_api_key = false;
        assert_eq!(prefs.active_keys(&defaults), vec!["mine".to_string()]);
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(UserPreferences::default()).unwrap();
        assert_eq!(value["fashionAspectRatio"], "9:16");
        assert_eq!(value["useDefaultApiKey"], true);
        assert!(value.get("rateLimitCooldownSecs").is_some());
    }
}
