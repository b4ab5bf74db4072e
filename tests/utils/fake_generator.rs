/// In-process stand-in for the remote image model
///
/// Records every call, tracks how many are in flight at once and fails
/// calls on demand through a script.
use scene_forge_lib::modules::credentials::Credential;
use scene_forge_lib::modules::generation::domain::{
    AspectRatio, ImageData, ImageGenerationService, SceneRequest,
};
use scene_forge_lib::shared::errors::{AppError, AppResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    RemoveBackground,
    Scene,
    TextToImage,
    Edit,
}

#[derive(Debug, Clone)]
pub struct Call {
    /// Position among all calls, starting at 0
    pub index: usize,
    pub kind: CallKind,
    pub credential: String,
    /// Product, subject or source image
    pub input: Option<ImageData>,
    pub character: Option<ImageData>,
    pub instruction: String,
    pub background_reference: Option<ImageData>,
    pub seed: Option<u64>,
    pub started_at: Instant,
    pub finished_at: Option<Instant>,
}

/// Decides whether a call fails; the second argument counts earlier calls
/// of the same kind with the same input
type FailureScript = Box<dyn Fn(&Call, usize) -> Option<AppError> + Send + Sync>;

pub struct FakeGenerator {
    delay: Duration,
    script: Option<FailureScript>,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            script: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_when<F>(mut self, script: F) -> Self
    where
        F: Fn(&Call, usize) -> Option<AppError> + Send + Sync + 'static,
    {
        self.script = Some(Box::new(script));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.kind == kind)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Output of the call at `index`
    pub fn output_of(index: usize) -> ImageData {
        ImageData::from_bytes("image/png", format!("output-{}", index).as_bytes())
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle(
        &self,
        kind: CallKind,
        credential: &Credential,
        input: Option<ImageData>,
        character: Option<ImageData>,
        instruction: &str,
        background_reference: Option<ImageData>,
        seed: Option<u64>,
    ) -> AppResult<ImageData> {
        let (index, failure) = {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            let attempt = calls
                .iter()
                .filter(|call| call.kind == kind && call.input == input)
                .count();
            let call = Call {
                index,
                kind,
                credential: credential.expose().to_string(),
                input,
                character,
                instruction: instruction.to_string(),
                background_reference,
                seed,
                started_at: Instant::now(),
                finished_at: None,
            };
            let failure = self.script.as_ref().and_then(|script| script(&call, attempt));
            calls.push(call);
            (index, failure)
        };

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().unwrap()[index].finished_at = Some(Instant::now());

        match failure {
            Some(error) => Err(error),
            None => Ok(Self::output_of(index)),
        }
    }
}

#[async_trait]
impl ImageGenerationService for FakeGenerator {
    async fn remove_background(
        &self,
        credential: &Credential,
        image: &ImageData,
        instruction: &str,
    ) -> AppResult<ImageData> {
        self.handle(
            CallKind::RemoveBackground,
            credential,
            Some(image.clone()),
            None,
            instruction,
            None,
            None,
        )
        .await
    }

    async fn generate_scene(
        &self,
        credential: &Credential,
        request: SceneRequest,
    ) -> AppResult<ImageData> {
        self.handle(
            CallKind::Scene,
            credential,
            Some(request.subject),
            Some(request.character),
            &request.instruction,
            request.background_reference,
            request.seed,
        )
        .await
    }

    async fn generate_image_from_text(
        &self,
        credential: &Credential,
        instruction: &str,
        _aspect_ratio: AspectRatio,
    ) -> AppResult<ImageData> {
        self.handle(
            CallKind::TextToImage,
            credential,
            None,
            None,
            instruction,
            None,
            None,
        )
        .await
    }

    async fn edit_image(
        &self,
        credential: &Credential,
        image: &ImageData,
        instruction: &str,
    ) -> AppResult<ImageData> {
        self.handle(
            CallKind::Edit,
            credential,
            Some(image.clone()),
            None,
            instruction,
            None,
            None,
        )
        .await
    }
}

pub fn rate_limited() -> AppError {
    AppError::RateLimitError("HTTP 429".to_string())
}

pub fn generation_failed() -> AppError {
    AppError::GenerationError("The API returned no image.".to_string())
}
