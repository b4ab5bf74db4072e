//! Process-level configuration read from the environment (`.env` supported).

use crate::log_warn;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_PREFERENCES_FILE: &str = "scene-forge-preferences.json";
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 2.0;
pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Built-in credential pool used when the user opts into default keys
    pub default_api_keys: Vec<String>,
    pub api_base_url: String,
    /// Client-side request pacing per credential
    pub requests_per_second: f64,
    pub preferences_path: PathBuf,
    /// Where automatic downloads are written
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_api_keys: Vec::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_api_keys = lookup("GEMINI_API_KEYS")
            .map(|raw| split_keys(&raw))
            .unwrap_or_default();

        if default_api_keys.is_empty() {
            log_warn!("GEMINI_API_KEYS not set: the built-in credential pool is empty");
        }

        let requests_per_second = match lookup("GEMINI_REQUESTS_PER_SECOND") {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(value) if value > 0.0 => value,
                _ => {
                    log_warn!(
                        "Ignoring invalid GEMINI_REQUESTS_PER_SECOND '{}', using {}",
                        raw,
                        DEFAULT_REQUESTS_PER_SECOND
                    );
                    DEFAULT_REQUESTS_PER_SECOND
                }
            },
            None => defaults.requests_per_second,
        };

        Self {
            default_api_keys,
            api_base_url: lookup("GEMINI_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            requests_per_second,
            preferences_path: lookup("SCENE_FORGE_PREFERENCES")
                .map(PathBuf::from)
                .unwrap_or(defaults.preferences_path),
            output_dir: lookup("SCENE_FORGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        }
    }
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_keys_are_split_and_trimmed() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEYS", " k1, k2 ,,k3 ")]));
        assert_eq!(config.default_api_keys, vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn test_invalid_rate_falls_back() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("GEMINI_REQUESTS_PER_SECOND", "-3")]));
        assert_eq!(config.requests_per_second, DEFAULT_REQUESTS_PER_SECOND);
    }

    #[test]
    fn test_base_url_trailing_slash_removed() {
        let config = AppConfig::from_lookup(lookup_from(&[(
            "GEMINI_API_BASE_URL",
            "http://localhost:8080/v1/",
        )]));
        assert_eq!(config.api_base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_output_dir_override() {
        let config = AppConfig::from_lookup(lookup_from(&[("SCENE_FORGE_OUTPUT_DIR", "/tmp/shots")]));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/shots"));
    }
}
