/// Text model returning a canned JSON value
use scene_forge_lib::modules::advisory::AdvisoryModel;
use scene_forge_lib::modules::credentials::Credential;
use scene_forge_lib::modules::generation::domain::ImageData;
use scene_forge_lib::shared::errors::AppResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

pub struct CannedAdvisor {
    response: Mutex<Value>,
    prompts: Mutex<Vec<String>>,
}

impl CannedAdvisor {
    pub fn new(response: Value) -> Self {
        Self {
            response: Mutex::new(response),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn respond_with(&self, response: Value) {
        *self.response.lock().unwrap() = response;
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdvisoryModel for CannedAdvisor {
    async fn generate_json(
        &self,
        _credential: &Credential,
        prompt: &str,
        _images: &[ImageData],
    ) -> AppResult<Value> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.lock().unwrap().clone())
    }
}
