/// Generation service
///
/// The studio never talks to the network directly. Everything that
/// produces media goes through the `GenerationService` trait:
/// - `gemini.rs` - Google Gemini / Veo REST implementation
/// - `mock.rs` - in-memory double used by the tests
///
/// Results are media URIs the UI can display (`file://` URIs into the
/// media cache).

pub mod gemini;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::media::{ImageRef, MediaError, UploadedImage};
use crate::state::data::AspectRatio;

pub use gemini::GeminiService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No API key is configured. Set GEMINI_API_KEY or select a key.")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream error message, kept verbatim
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("The model returned no {0}")]
    NoMedia(&'static str),

    #[error("The request was blocked ({0})")]
    Blocked(String),

    #[error("Video generation failed: {0}")]
    OperationFailed(String),

    #[error("Video generation timed out after {0} status checks")]
    TimedOut(u32),

    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Character passed to scene composition, in back-to-front order
#[derive(Debug, Clone)]
pub struct SceneCharacter {
    pub name: String,
    pub image: ImageRef,
    pub prompt: String,
}

/// Callback receiving human-readable progress updates
pub type ProgressFn<'a> = &'a (dyn Fn(String) + Send + Sync);

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Compose one image from the characters (back layer first) and a prompt
    async fn compose_scene(
        &self,
        characters: &[SceneCharacter],
        prompt: &str,
    ) -> Result<String, ServiceError>;

    /// Edit a single uploaded image according to the prompt
    async fn edit_image(&self, image: &UploadedImage, prompt: &str) -> Result<String, ServiceError>;

    /// Animate a starting image; `on_progress` may fire any number of times
    async fn generate_video(
        &self,
        image: &UploadedImage,
        prompt: &str,
        aspect_ratio: AspectRatio,
        on_progress: ProgressFn<'_>,
    ) -> Result<String, ServiceError>;

    /// Generate a character portrait from a description
    async fn create_character(&self, prompt: &str) -> Result<String, ServiceError>;

    /// Use `key` for subsequent requests
    fn set_api_key(&self, key: String);
}
