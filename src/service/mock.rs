//! Test double for the generation service

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GenerationService, ProgressFn, SceneCharacter, ServiceError};
use crate::media::UploadedImage;
use crate::state::data::AspectRatio;

/// In-memory service that records calls and replays canned outcomes
#[derive(Default)]
pub struct MockService {
    pub calls: AtomicUsize,
    pub failure: Option<String>,
    pub progress: Vec<String>,
    pub scene_names: Mutex<Vec<String>>,
}

impl MockService {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn outcome(&self, url: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(ServiceError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(url.to_string()),
        }
    }
}

#[async_trait]
impl GenerationService for MockService {
    async fn compose_scene(
        &self,
        characters: &[SceneCharacter],
        _prompt: &str,
    ) -> Result<String, ServiceError> {
        *self.scene_names.lock().unwrap() = characters.iter().map(|c| c.name.clone()).collect();
        self.outcome("file:///scene.png")
    }

    async fn edit_image(&self, _image: &UploadedImage, _prompt: &str) -> Result<String, ServiceError> {
        self.outcome("file:///edit.png")
    }

    async fn generate_video(
        &self,
        _image: &UploadedImage,
        _prompt: &str,
        _aspect_ratio: AspectRatio,
        on_progress: ProgressFn<'_>,
    ) -> Result<String, ServiceError> {
        for message in &self.progress {
            on_progress(message.clone());
        }
        self.outcome("file:///video.mp4")
    }

    async fn create_character(&self, _prompt: &str) -> Result<String, ServiceError> {
        self.outcome("file:///portrait.png")
    }

    fn set_api_key(&self, _key: String) {}
}
