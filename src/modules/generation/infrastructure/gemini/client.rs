//! HTTP client for the Gemini / Imagen REST API
//!
//! Paces requests per credential with a keyed governor limiter, retries
//! transient server failures, and maps quota or auth rejections to
//! `AppError::RateLimitError` so callers can cool the credential down.

use super::dto::{
    ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    PredictRequest, PredictResponse,
};
use super::retry_policy::{is_retryable_error, is_retryable_status, RetryPolicy};
use crate::modules::advisory::domain::AdvisoryModel;
use crate::modules::credentials::Credential;
use crate::modules::generation::domain::{
    AspectRatio, ImageData, ImageGenerationService, SceneRequest,
};
use crate::shared::config::AppConfig;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::LogContext;
use async_trait::async_trait;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::time::sleep;

pub const IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const TEXT_TO_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
pub const ADVISORY_MODEL: &str = "gemini-2.5-pro";

const REQUEST_TIMEOUT_SECS: u64 = 120;
const USER_AGENT: &str = "scene-forge/0.1";

static RATE_LIMIT_MESSAGE: OnceLock<Option<Regex>> = OnceLock::new();

fn rate_limit_message_pattern() -> Option<&'static Regex> {
    RATE_LIMIT_MESSAGE
        .get_or_init(|| {
            Regex::new(r"(?i)429|rate limit|resource has been exhausted|api key (is invalid|not valid)")
                .ok()
        })
        .as_ref()
}

/// Map a failed response to the error taxonomy
pub fn classify_failure(status: Option<StatusCode>, message: &str) -> AppError {
    let quota_status = matches!(
        status.map(|s| s.as_u16()),
        Some(429) | Some(401) | Some(403)
    );
    let quota_message = rate_limit_message_pattern()
        .map(|pattern| pattern.is_match(message))
        .unwrap_or(false);

    if quota_status || quota_message {
        return AppError::RateLimitError(format!(
            "API key is rate limited or invalid: {}",
            message
        ));
    }

    match status {
        Some(status) => AppError::ApiError(format!("HTTP {}: {}", status, message)),
        None => AppError::ExternalServiceError(message.to_string()),
    }
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    limiter: DefaultKeyedRateLimiter<String>,
    retry_policy: RetryPolicy,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        Ok(Self::with_parts(
            create_http_client(REQUEST_TIMEOUT_SECS)?,
            &config.api_base_url,
            config.requests_per_second,
            RetryPolicy::gemini(),
        ))
    }

    pub fn with_parts(
        client: Client,
        base_url: &str,
        requests_per_second: f64,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::keyed(Self::quota(requests_per_second)),
            retry_policy,
        }
    }

    fn quota(requests_per_second: f64) -> Quota {
        let period = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::from_secs(1)
        };
        let burst = NonZeroU32::new(requests_per_second.ceil().max(1.0) as u32)
            .unwrap_or(NonZeroU32::MIN);
        Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if a request can be made now for this credential
    pub fn can_make_request_now(&self, credential: &Credential) -> bool {
        self.limiter
            .check_key(&credential.expose().to_string())
            .is_ok()
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn generate_content(
        &self,
        credential: &Credential,
        model: &str,
        request: &GenerateContentRequest,
    ) -> AppResult<GenerateContentResponse> {
        self.post(credential, model, "generateContent", request).await
    }

    async fn generate_image(
        &self,
        credential: &Credential,
        operation: &str,
        parts: Vec<Part>,
        seed: Option<u64>,
    ) -> AppResult<ImageData> {
        let request = GenerateContentRequest::new(parts, GenerationConfig::image(seed));
        let started = Instant::now();
        let result = self
            .generate_content(credential, IMAGE_MODEL, &request)
            .await
            .and_then(|response| response.into_image("The API returned no image."));
        LogContext::api_call(
            IMAGE_MODEL,
            operation,
            if result.is_ok() { "ok" } else { "failed" },
            Some(started.elapsed().as_millis() as u64),
        );
        result
    }

    async fn post<B, T>(
        &self,
        credential: &Credential,
        model: &str,
        method: &str,
        body: &B,
    ) -> AppResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(model, method);
        let key = credential.expose().to_string();
        let mut attempt = 0;

        loop {
            self.limiter.until_key_ready(&key).await;
            tracing::debug!(model, method, attempt, "sending request");

            let sent = self
                .client
                .post(&url)
                .header("x-goog-api-key", credential.expose())
                .json(body)
                .send()
                .await;

            match sent {
                Ok(response) if response.status().is_success() => {
                    return parse_response(response).await;
                }
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    if is_retryable_status(status) && attempt < self.retry_policy.max_retries {
                        let delay = self.retry_policy.calculate_delay(attempt);
                        tracing::warn!(%status, ?delay, "{} returned a server error, retrying", model);
                        attempt += 1;
                        sleep(delay).await;
                        continue;
                    }
                    return Err(classify_failure(Some(status), &error_message(&text)));
                }
                Err(e) => {
                    if is_retryable_error(&e) && attempt < self.retry_policy.max_retries {
                        let delay = self.retry_policy.calculate_delay(attempt);
                        tracing::warn!(error = %e, ?delay, "{} request failed, retrying", model);
                        attempt += 1;
                        sleep(delay).await;
                        continue;
                    }
                    return Err(match e.status() {
                        Some(status) => classify_failure(Some(status), &e.to_string()),
                        None => AppError::from(e),
                    });
                }
            }
        }
    }
}

fn create_http_client(timeout_secs: u64) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AppError::ExternalServiceError(format!("Failed to create HTTP client: {}", e)))
}

/// Prefer the structured `error.message`, else a truncated raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) if !envelope.error.message.contains(&status) => {
                format!("{} ({})", envelope.error.message, status)
            }
            _ => envelope.error.message,
        },
        Err(_) => truncate(body),
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() > 200 {
        format!("{}...", text.chars().take(200).collect::<String>())
    } else {
        text.to_string()
    }
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let text = response.text().await.map_err(|e| {
        AppError::SerializationError(format!("Failed to read Gemini response: {}", e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        AppError::SerializationError(format!(
            "Failed to parse Gemini response: {}. Response: {}",
            e,
            truncate(&text)
        ))
    })
}

#[async_trait]
impl ImageGenerationService for GeminiClient {
    async fn remove_background(
        &self,
        credential: &Credential,
        image: &ImageData,
        instruction: &str,
    ) -> AppResult<ImageData> {
        let parts = vec![Part::text(instruction), Part::image(image)?];
        self.generate_image(credential, "remove_background", parts, None)
            .await
    }

    async fn generate_scene(
        &self,
        credential: &Credential,
        request: SceneRequest,
    ) -> AppResult<ImageData> {
        let mut parts = vec![
            Part::text(request.instruction.as_str()),
            Part::image(&request.subject)?,
            Part::image(&request.character)?,
        ];
        if let Some(background) = &request.background_reference {
            parts.push(Part::image(background)?);
        }
        self.generate_image(credential, "generate_scene", parts, request.seed)
            .await
    }

    async fn generate_image_from_text(
        &self,
        credential: &Credential,
        instruction: &str,
        aspect_ratio: AspectRatio,
    ) -> AppResult<ImageData> {
        let request = PredictRequest::single_png(instruction, aspect_ratio.as_str());
        let started = Instant::now();
        let result = self
            .post::<_, PredictResponse>(credential, TEXT_TO_IMAGE_MODEL, "predict", &request)
            .await
            .and_then(PredictResponse::into_image);
        LogContext::api_call(
            TEXT_TO_IMAGE_MODEL,
            "generate_image_from_text",
            if result.is_ok() { "ok" } else { "failed" },
            Some(started.elapsed().as_millis() as u64),
        );
        result
    }

    async fn edit_image(
        &self,
        credential: &Credential,
        image: &ImageData,
        instruction: &str,
    ) -> AppResult<ImageData> {
        let parts = vec![Part::text(instruction), Part::image(image)?];
        self.generate_image(credential, "edit_image", parts, None)
            .await
    }
}

#[async_trait]
impl AdvisoryModel for GeminiClient {
    async fn generate_json(
        &self,
        credential: &Credential,
        prompt: &str,
        images: &[ImageData],
    ) -> AppResult<Value> {
        let mut parts = vec![Part::text(prompt)];
        for image in images {
            parts.push(Part::image(image)?);
        }
        let request = GenerateContentRequest::new(parts, GenerationConfig::json());
        let text = self
            .generate_content(credential, ADVISORY_MODEL, &request)
            .await?
            .into_text()?;
        serde_json::from_str(&text).map_err(|e| {
            AppError::ValidationError(format!(
                "The model did not return valid JSON: {}. Response: {}",
                e,
                truncate(&text)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_statuses_are_rate_limits() {
        for code in [429u16, 401, 403] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(classify_failure(Some(status), "nope").is_rate_limit());
        }
    }

    #[test]
    fn test_quota_messages_are_rate_limits() {
        assert!(classify_failure(None, "Resource has been exhausted (e.g. check quota).").is_rate_limit());
        assert!(classify_failure(Some(StatusCode::BAD_REQUEST), "API key not valid. Please pass a valid API key.").is_rate_limit());
        assert!(classify_failure(None, "Rate Limit reached").is_rate_limit());
    }

    #[test]
    fn test_other_failures_are_not_rate_limits() {
        let err = classify_failure(Some(StatusCode::BAD_REQUEST), "Invalid image");
        assert!(matches!(err, AppError::ApiError(_)));
        assert!(!classify_failure(None, "connection reset").is_rate_limit());
    }

    #[test]
    fn test_error_message_prefers_envelope() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(error_message(body), "Quota exceeded (RESOURCE_EXHAUSTED)");
        assert_eq!(error_message("plain"), "plain");
        assert!(error_message(&"x".repeat(300)).ends_with("..."));
    }

    #[test]
    fn test_client_paces_per_credential() {
        let client = GeminiClient::with_parts(
            Client::new(),
            "http://localhost/v1beta/",
            1.0,
            RetryPolicy::none(),
        );
        let k1 = Credential::new("k1");
        let k2 = Credential::new("k2");

        assert_eq!(client.base_url(), "http://localhost/v1beta");
        assert!(client.can_make_request_now(&k1));
        assert!(!client.can_make_request_now(&k1));
        assert!(client.can_make_request_now(&k2));
    }
}
