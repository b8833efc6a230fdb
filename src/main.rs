use iced::futures::{SinkExt, Stream};
use iced::widget::{center, column, opaque, row, stack};
use iced::{Color, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod config;
mod media;
mod service;
mod state;
mod ui;

use config::StudioConfig;
use media::{ImageRef, UploadedImage};
use service::{GeminiService, GenerationService};
use state::data::{AspectRatio, CharacterId, GeneratedContent, ToolType};
use state::generation::Ticket;
use state::studio::{GenerationRequest, Studio};
use ui::creator::CreatorForm;
use ui::ImageCache;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// Which form an uploaded image belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadSlot {
    EditImage,
    VideoImage,
    Character,
}

/// Main application state
struct CharacterStudio {
    /// Library, layers, tool forms and generation state
    studio: Studio,
    /// Backend producing all generated media
    service: Arc<dyn GenerationService>,
    /// Display handles for every image the app knows about
    images: ImageCache,
    /// Open "New Character" modal, if any
    creator: Option<CreatorForm>,
    /// Layer currently being dragged in the layer manager
    dragged_layer: Option<CharacterId>,
    /// Contents of the API key gate
    key_input: String,
    /// Transient notice below the controls (uploads, saves)
    notice: Option<String>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    ToolSelected(ToolType),
    CharacterToggled(CharacterId),

    LayerDragStarted(CharacterId),
    LayerDropped(CharacterId),
    LayerDragCancelled,

    ScenePromptChanged(String),
    EditPromptChanged(String),
    VideoPromptChanged(String),
    AspectRatioSelected(AspectRatio),
    PickUpload(UploadSlot),
    UploadLoaded(UploadSlot, Result<UploadedImage, String>),

    ApiKeyInputChanged(String),
    ApiKeySelected,

    Generate,
    GenerationProgress(Ticket, String),
    GenerationFinished(Ticket, Result<GeneratedContent, String>),
    SaveResult,
    ResultSaved(Result<PathBuf, String>),
    OpenResult,

    OpenCreator,
    CloseCreator,
    CreatorNameChanged(String),
    CreatorPromptChanged(String),
    CreatorGenerate,
    CreatorGenerated(Uuid, Result<String, String>),
    CreatorSave,
}

impl CharacterStudio {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = StudioConfig::load().unwrap_or_else(|err| {
            tracing::error!("⚠️  {}; falling back to defaults", err);
            StudioConfig::default()
        });

        tracing::info!(
            "🎨 Character Studio ready (image model {}, video model {})",
            config.image_model,
            config.video_model
        );

        let key_input = config.api_key().unwrap_or_default().to_string();
        let service: Arc<dyn GenerationService> = Arc::new(GeminiService::new(&config));

        (
            CharacterStudio {
                studio: Studio::new(),
                service,
                images: ImageCache::default(),
                creator: None,
                dragged_layer: None,
                key_input,
                notice: None,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ToolSelected(tool) => {
                self.studio.set_active_tool(tool);
                Task::none()
            }
            Message::CharacterToggled(id) => {
                self.studio.toggle_character(&id);
                Task::none()
            }
            Message::LayerDragStarted(id) => {
                self.dragged_layer = Some(id);
                Task::none()
            }
            Message::LayerDropped(target) => {
                if let Some(dragged) = self.dragged_layer.take() {
                    self.studio.move_layer(&dragged, &target);
                }
                Task::none()
            }
            Message::LayerDragCancelled => {
                self.dragged_layer = None;
                Task::none()
            }
            Message::ScenePromptChanged(prompt) => {
                self.studio.forms.scene.prompt = prompt;
                Task::none()
            }
            Message::EditPromptChanged(prompt) => {
                self.studio.forms.edit.prompt = prompt;
                Task::none()
            }
            Message::VideoPromptChanged(prompt) => {
                self.studio.forms.video.prompt = prompt;
                Task::none()
            }
            Message::AspectRatioSelected(ratio) => {
                self.studio.forms.video.aspect_ratio = ratio;
                Task::none()
            }
            Message::PickUpload(slot) => {
                // Show the native file picker dialog
                let file = FileDialog::new()
                    .set_title("Select an Image")
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .pick_file();

                match file {
                    Some(path) => Task::perform(UploadedImage::load(path), move |result| {
                        Message::UploadLoaded(slot, result.map_err(|err| err.to_string()))
                    }),
                    None => Task::none(),
                }
            }
            Message::UploadLoaded(slot, result) => {
                self.apply_upload(slot, result);
                Task::none()
            }
            Message::ApiKeyInputChanged(key) => {
                self.key_input = key;
                Task::none()
            }
            Message::ApiKeySelected => {
                let key = self.key_input.trim();
                if key.is_empty() {
                    self.notice = Some("Please enter an API key.".to_string());
                } else {
                    self.service.set_api_key(key.to_string());
                    self.studio.select_key();
                    self.notice = None;
                }
                Task::none()
            }
            Message::Generate => match self.studio.request_generation() {
                Some(request) => run_generation(Arc::clone(&self.service), request),
                None => Task::none(),
            },
            Message::GenerationProgress(ticket, progress) => {
                self.studio.report_progress(ticket, progress);
                Task::none()
            }
            Message::GenerationFinished(ticket, outcome) => {
                if let Ok(GeneratedContent::Image { url }) = &outcome {
                    self.images.insert(&ImageRef::new(url.as_str()));
                }
                self.studio.complete_generation(ticket, outcome);
                Task::none()
            }
            Message::SaveResult => self.save_result(),
            Message::OpenResult => {
                if let Some(path) = self.studio.result_file() {
                    tracing::info!("▶️ Opening {}", path.display());
                    if let Err(err) = open::that(&path) {
                        tracing::error!("Failed to open {}: {}", path.display(), err);
                        self.notice = Some(format!("⚠️  Could not open: {}", err));
                    }
                }
                Task::none()
            }
            Message::ResultSaved(result) => {
                self.notice = Some(match result {
                    Ok(path) => format!("✅ Saved to {}", path.display()),
                    Err(err) => format!("⚠️  Could not save: {}", err),
                });
                Task::none()
            }
            Message::OpenCreator => {
                self.creator = Some(CreatorForm::new());
                Task::none()
            }
            Message::CloseCreator => {
                self.creator = None;
                Task::none()
            }
            Message::CreatorNameChanged(name) => {
                if let Some(form) = &mut self.creator {
                    form.name = name;
                }
                Task::none()
            }
            Message::CreatorPromptChanged(prompt) => {
                if let Some(form) = &mut self.creator {
                    form.prompt = prompt;
                }
                Task::none()
            }
            Message::CreatorGenerate => {
                let Some(form) = &mut self.creator else {
                    return Task::none();
                };

                match form.portrait_prompt() {
                    Ok(prompt) => {
                        form.generating = true;
                        form.error = None;
                        let token = form.token();
                        let service = Arc::clone(&self.service);
                        Task::perform(
                            async move {
                                service
                                    .create_character(&prompt)
                                    .await
                                    .map_err(|err| err.to_string())
                            },
                            move |result| Message::CreatorGenerated(token, result),
                        )
                    }
                    Err(message) => {
                        form.error = Some(message.to_string());
                        Task::none()
                    }
                }
            }
            Message::CreatorGenerated(token, result) => {
                // The modal may have been closed or reopened while the portrait was generating
                if let Some(form) = &mut self.creator {
                    if let Some(portrait) = form.finish_portrait(token, result) {
                        self.images.insert(&portrait);
                    }
                }
                Task::none()
            }
            Message::CreatorSave => {
                match self.creator.as_ref().map(CreatorForm::build) {
                    Some(Ok(character)) => {
                        self.studio.add_character(character);
                        self.creator = None;
                    }
                    Some(Err(message)) => {
                        if let Some(form) = &mut self.creator {
                            form.error = Some(message.to_string());
                        }
                    }
                    None => {}
                }
                Task::none()
            }
        }
    }

    /// Route a loaded upload to the form that asked for it
    fn apply_upload(&mut self, slot: UploadSlot, result: Result<UploadedImage, String>) {
        let upload = match result {
            Ok(upload) => upload,
            Err(err) => {
                tracing::warn!("Upload failed: {}", err);
                let message = format!("⚠️  {}", err);
                match (slot, &mut self.creator) {
                    (UploadSlot::Character, Some(form)) => form.error = Some(message),
                    _ => self.notice = Some(message),
                }
                return;
            }
        };

        self.notice = None;
        match slot {
            UploadSlot::EditImage => self.studio.forms.edit.image = Some(upload),
            UploadSlot::VideoImage => self.studio.forms.video.image = Some(upload),
            UploadSlot::Character => {
                if let Some(form) = &mut self.creator {
                    let portrait = upload.to_image_ref();
                    self.images.insert(&portrait);
                    form.image = Some(portrait);
                    form.error = None;
                }
            }
        }
    }

    /// Copy the current result out of the media cache
    fn save_result(&mut self) -> Task<Message> {
        let Some(source) = self.studio.result_file() else {
            return Task::none();
        };

        let extension = source
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();

        let Some(destination) = FileDialog::new()
            .set_title("Save Generated Media")
            .set_file_name(format!("generated.{}", extension))
            .save_file()
        else {
            return Task::none();
        };

        Task::perform(
            async move {
                tokio::fs::copy(&source, &destination)
                    .await
                    .map(|_| destination)
                    .map_err(|err| err.to_string())
            },
            Message::ResultSaved,
        )
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let body = row![
            ui::sidebar::view(&self.studio, &self.images),
            ui::canvas::view(&self.studio, &self.images, self.dragged_layer.as_ref()),
            ui::controls::view(&self.studio, &self.key_input, self.notice.as_deref()),
        ]
        .height(Length::Fill);

        let base = column![ui::header::view(self.studio.active_tool()), body];

        match &self.creator {
            Some(form) => stack![
                base,
                opaque(center(opaque(form.view(&self.images))).style(|_theme: &Theme| {
                    iced::widget::container::Style {
                        background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.7).into()),
                        ..iced::widget::container::Style::default()
                    }
                })),
            ]
            .into(),
            None => base.into(),
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Run one generation in the background, streaming progress back
fn run_generation(service: Arc<dyn GenerationService>, request: GenerationRequest) -> Task<Message> {
    Task::run(generation_stream(service, request), std::convert::identity)
}

/// Progress messages of one request followed by its outcome
fn generation_stream(
    service: Arc<dyn GenerationService>,
    request: GenerationRequest,
) -> impl Stream<Item = Message> {
    let GenerationRequest { ticket, job } = request;

    iced::stream::channel(16, move |mut output| async move {
        let progress = Mutex::new(output.clone());
        let on_progress = move |message: String| {
            if let Ok(mut sender) = progress.lock() {
                let _ = sender.try_send(Message::GenerationProgress(ticket, message));
            }
        };

        let outcome = job.run(service.as_ref(), &on_progress).await;
        let _ = output.send(Message::GenerationFinished(ticket, outcome)).await;
    })
}

fn main() -> iced::Result {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("character_studio=info")),
        )
        .try_init();

    iced::application(
        "Character Studio",
        CharacterStudio::update,
        CharacterStudio::view,
    )
    .theme(CharacterStudio::theme)
    .window_size((1280.0, 800.0))
    .centered()
    .run_with(CharacterStudio::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::futures::StreamExt;
    use service::mock::MockService;

    fn app_with(service: MockService) -> CharacterStudio {
        CharacterStudio {
            studio: Studio::new(),
            service: Arc::new(service),
            images: ImageCache::default(),
            creator: None,
            dragged_layer: None,
            key_input: String::new(),
            notice: None,
        }
    }

    fn upload() -> UploadedImage {
        UploadedImage {
            name: "start.png".to_string(),
            mime_type: "image/png".to_string(),
            data: Arc::new(vec![0x89, b'P', b'N', b'G']),
        }
    }

    #[tokio::test]
    async fn test_stream_delivers_progress_then_outcome() {
        let service = MockService {
            progress: vec!["Composing frames...".to_string(), "Downloading your video...".to_string()],
            ..MockService::default()
        };
        let mut app = app_with(service);
        app.studio.set_active_tool(ToolType::VideoGenerator);
        app.studio.select_key();
        app.studio.forms.video.image = Some(upload());

        let request = app.studio.request_generation().unwrap();
        let ticket = request.ticket;
        let messages: Vec<Message> = generation_stream(Arc::clone(&app.service), request)
            .collect()
            .await;

        assert_eq!(messages.len(), 3);
        assert!(matches!(
            &messages[0],
            Message::GenerationProgress(t, m) if *t == ticket && m == "Composing frames..."
        ));
        assert!(matches!(
            &messages[2],
            Message::GenerationFinished(t, Ok(GeneratedContent::Video { url })) if *t == ticket && url == "file:///video.mp4"
        ));

        let mut messages = messages.into_iter();
        let _ = app.update(messages.next().unwrap());
        let _ = app.update(messages.next().unwrap());
        assert_eq!(
            app.studio.generation().phase(),
            state::generation::Phase::Loading("Downloading your video...")
        );

        let _ = app.update(messages.next().unwrap());
        assert_eq!(
            app.studio.result_file(),
            Some(PathBuf::from("/video.mp4"))
        );
    }

    #[test]
    fn test_portrait_from_closed_modal_is_dropped() {
        let mut app = app_with(MockService::default());

        let _ = app.update(Message::OpenCreator);
        let _ = app.update(Message::CreatorPromptChanged("A cat in a pirate coat".to_string()));
        let _ = app.update(Message::CreatorGenerate);
        let stale = app.creator.as_ref().unwrap().token();
        let _ = app.update(Message::CloseCreator);

        let _ = app.update(Message::OpenCreator);
        let _ = app.update(Message::UploadLoaded(UploadSlot::Character, Ok(upload())));
        let uploaded = app.creator.as_ref().unwrap().image.clone();
        assert!(uploaded.is_some());

        let _ = app.update(Message::CreatorGenerated(stale, Ok("file:///late.png".to_string())));

        let form = app.creator.as_ref().unwrap();
        assert_eq!(form.image, uploaded);
        assert!(app.images.get("file:///late.png").is_none());
    }
}
