use crate::modules::credentials::Credential;
use crate::modules::generation::domain::ImageData;
use crate::shared::errors::AppResult;
use async_trait::async_trait;
use serde_json::Value;

/// Text model asked for structured JSON suggestions
///
/// The returned value is unchecked; callers validate its shape before use.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdvisoryModel: Send + Sync {
    async fn generate_json(
        &self,
        credential: &Credential,
        prompt: &str,
        images: &[ImageData],
    ) -> AppResult<Value>;
}
