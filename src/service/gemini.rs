//! Gemini / Veo backend for the generation service
//!
//! Images go through `models/{model}:generateContent` with inline image
//! parts. Videos are long-running operations started with
//! `models/{model}:predictLongRunning` and polled until done.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{GenerationService, ProgressFn, SceneCharacter, ServiceError};
use crate::config::StudioConfig;
use crate::media::{MediaStore, UploadedImage};
use crate::state::data::AspectRatio;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Rotating status lines shown while a video operation is pending
const VIDEO_PROGRESS_MESSAGES: [&str; 4] = [
    "Generating video... this can take a few minutes.",
    "Composing frames...",
    "Adding motion and lighting...",
    "Still working, video models take their time...",
];

// ========== Wire types ==========

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn image(mime_type: &str, data: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(data),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<VideoInstance>,
    parameters: VideoParameters,
}

#[derive(Serialize)]
struct VideoInstance {
    prompt: String,
    image: VideoImage,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParameters {
    aspect_ratio: &'static str,
}

#[derive(Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<ApiErrorDetail>,
    response: Option<OperationResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<VideoResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResponse {
    #[serde(default, alias = "generatedVideos")]
    generated_samples: Vec<VideoSample>,
}

#[derive(Deserialize)]
struct VideoSample {
    video: Option<VideoFile>,
}

#[derive(Deserialize)]
struct VideoFile {
    uri: String,
}

impl Operation {
    /// Download location of the first generated video
    fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .iter()
            .find_map(|sample| sample.video.as_ref())
            .map(|video| video.uri.as_str())
    }
}

// ========== Service ==========

/// Generation service backed by the Gemini REST API
pub struct GeminiService {
    client: reqwest::Client,
    api_key: RwLock<Option<String>>,
    api_base: String,
    image_model: String,
    video_model: String,
    poll_interval: Duration,
    max_video_polls: u32,
    media: MediaStore,
}

impl GeminiService {
    pub fn new(config: &StudioConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!("⚠️  HTTP client setup failed ({}), using defaults without a timeout", err);
                reqwest::Client::new()
            });

        Self {
            client,
            api_key: RwLock::new(config.api_key().map(str::to_string)),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            image_model: config.image_model.clone(),
            video_model: config.video_model.clone(),
            poll_interval: config.poll_interval(),
            max_video_polls: config.max_video_polls,
            media: config.media_store(),
        }
    }

    fn key(&self) -> Result<String, ServiceError> {
        self.api_key
            .read()
            .ok()
            .and_then(|key| key.clone())
            .ok_or(ServiceError::MissingApiKey)
    }

    /// Run a `generateContent` call and save the first returned image
    async fn generate_image(&self, parts: Vec<Part>) -> Result<String, ServiceError> {
        let key = self.key()?;
        let url = format!("{}/models/{}:generateContent", self.api_base, self.image_model);
        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
            },
        };

        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await?;

        let response: GenerateContentResponse = check_status(response).await?.json().await?;
        let image = first_image(response)?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(&image.data)
            .map_err(crate::media::MediaError::from)?;

        Ok(self.media.save(&data, &image.mime_type).await?)
    }

    async fn start_video(
        &self,
        key: &str,
        image: &UploadedImage,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<Operation, ServiceError> {
        let url = format!("{}/models/{}:predictLongRunning", self.api_base, self.video_model);
        let body = PredictRequest {
            instances: vec![VideoInstance {
                prompt: prompt.to_string(),
                image: VideoImage {
                    bytes_base64_encoded: base64::engine::general_purpose::STANDARD
                        .encode(image.data.as_slice()),
                    mime_type: image.mime_type.clone(),
                },
            }],
            parameters: VideoParameters {
                aspect_ratio: aspect_ratio.as_str(),
            },
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, key)
            .json(&body)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    async fn poll_operation(&self, key: &str, name: &str) -> Result<Operation, ServiceError> {
        let url = format!("{}/{}", self.api_base, name);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, key)
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    async fn download(&self, key: &str, uri: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .client
            .get(uri)
            .header(API_KEY_HEADER, key)
            .send()
            .await?;

        Ok(check_status(response).await?.bytes().await?.to_vec())
    }
}

#[async_trait]
impl GenerationService for GeminiService {
    async fn compose_scene(
        &self,
        characters: &[SceneCharacter],
        prompt: &str,
    ) -> Result<String, ServiceError> {
        tracing::info!("🎬 Composing scene with {} characters", characters.len());

        let mut parts = Vec::with_capacity(characters.len() * 2 + 1);
        for (layer, character) in characters.iter().enumerate() {
            let blob = character.image.load().await?;
            parts.push(Part::text(layer_caption(layer, characters.len(), character)));
            parts.push(Part::image(&blob.mime_type, &blob.data));
        }
        parts.push(Part::text(scene_instructions(prompt)));

        self.generate_image(parts).await
    }

    async fn edit_image(&self, image: &UploadedImage, prompt: &str) -> Result<String, ServiceError> {
        tracing::info!("🖌️ Editing {} ({})", image.name, image.mime_type);

        let parts = vec![
            Part::image(&image.mime_type, &image.data),
            Part::text(prompt),
        ];
        self.generate_image(parts).await
    }

    async fn generate_video(
        &self,
        image: &UploadedImage,
        prompt: &str,
        aspect_ratio: AspectRatio,
        on_progress: ProgressFn<'_>,
    ) -> Result<String, ServiceError> {
        let key = self.key()?;
        tracing::info!("🎥 Starting video generation ({})", aspect_ratio.as_str());

        on_progress("Sending your image to the video model...".to_string());
        let mut operation = self.start_video(&key, image, prompt, aspect_ratio).await?;

        let mut polls = 0;
        while !operation.done {
            if polls >= self.max_video_polls {
                return Err(ServiceError::TimedOut(polls));
            }
            on_progress(VIDEO_PROGRESS_MESSAGES[polls as usize % VIDEO_PROGRESS_MESSAGES.len()].to_string());
            tokio::time::sleep(self.poll_interval).await;

            operation = self.poll_operation(&key, &operation.name).await?;
            polls += 1;
            tracing::debug!("Video operation {} poll {} done={}", operation.name, polls, operation.done);
        }

        if let Some(error) = &operation.error {
            return Err(ServiceError::OperationFailed(error.message.clone()));
        }

        let uri = operation.video_uri().ok_or(ServiceError::NoMedia("video"))?;

        on_progress("Downloading your video...".to_string());
        let data = self.download(&key, uri).await?;
        Ok(self.media.save(&data, "video/mp4").await?)
    }

    async fn create_character(&self, prompt: &str) -> Result<String, ServiceError> {
        tracing::info!("🧑‍🎨 Generating character portrait");
        self.generate_image(vec![Part::text(portrait_instructions(prompt))]).await
    }

    fn set_api_key(&self, key: String) {
        if let Ok(mut current) = self.api_key.write() {
            *current = Some(key.trim().to_string());
            tracing::info!("🔑 API key selected");
        }
    }
}

/// Turn non-2xx responses into `ServiceError::Api` with the upstream message
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = api_error_message(&body).unwrap_or_else(|| {
        format!("Request failed with status {}", status)
    });

    tracing::warn!("Generation API error {}: {}", status, message);
    Err(ServiceError::Api {
        status: status.as_u16(),
        message,
    })
}

fn api_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|body| body.error.message)
        .filter(|message| !message.trim().is_empty())
}

fn first_image(response: GenerateContentResponse) -> Result<InlineData, ServiceError> {
    if let Some(reason) = response.prompt_feedback.and_then(|feedback| feedback.block_reason) {
        return Err(ServiceError::Blocked(reason));
    }

    response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.inline_data)
        .ok_or(ServiceError::NoMedia("image"))
}

fn layer_caption(layer: usize, total: usize, character: &SceneCharacter) -> String {
    let position = if total == 1 {
        "only layer".to_string()
    } else if layer == 0 {
        "back-most layer".to_string()
    } else if layer + 1 == total {
        "top layer".to_string()
    } else {
        format!("layer {} from the back", layer + 1)
    };

    format!(
        "Character \"{}\" ({}). Description: {}",
        character.name, position, character.prompt
    )
}

fn scene_instructions(prompt: &str) -> String {
    format!(
        "Compose a single cohesive image featuring every character shown above, \
         keeping each one recognisable. Characters listed later sit in front of \
         earlier ones. Scene: {prompt}"
    )
}

fn portrait_instructions(prompt: &str) -> String {
    format!(
        "Create a full-body character portrait on a plain background, suitable for \
         reuse in other scenes. Character: {prompt}"
    )
}
