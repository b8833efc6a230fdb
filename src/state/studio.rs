/// The studio: one owned container for all UI state
///
/// Holds the character library, the layer order of the selection, the
/// active tool with its form inputs, and the generation state machine.
/// Generate actions are turned into `GenerationRequest`s here; running
/// them is left to the caller (the iced update loop).

use std::path::PathBuf;

use super::data::{AspectRatio, Character, CharacterId, GeneratedContent, ToolType};
use super::generation::{classify_failure, GenerationState, Ticket};
use super::library::Library;
use super::selection::SelectionOrder;
use crate::media::{self, UploadedImage};
use crate::service::{GenerationService, ProgressFn, SceneCharacter};

const DEFAULT_SCENE_PROMPT: &str = "Two characters having a picnic in a sunny park.";
const DEFAULT_EDIT_PROMPT: &str = "Add a retro, vintage filter.";
const DEFAULT_VIDEO_PROMPT: &str = "A neon hologram of a cat driving at top speed";

#[derive(Debug, Clone)]
pub struct SceneForm {
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct EditForm {
    pub image: Option<UploadedImage>,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct VideoForm {
    /// The credential gate has been passed
    pub key_selected: bool,
    pub image: Option<UploadedImage>,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
}

/// Inputs of every tool; kept when switching between tools
#[derive(Debug, Clone)]
pub struct ToolForms {
    pub scene: SceneForm,
    pub edit: EditForm,
    pub video: VideoForm,
}

impl Default for ToolForms {
    fn default() -> Self {
        Self {
            scene: SceneForm {
                prompt: DEFAULT_SCENE_PROMPT.to_string(),
            },
            edit: EditForm {
                image: None,
                prompt: DEFAULT_EDIT_PROMPT.to_string(),
            },
            video: VideoForm {
                key_selected: false,
                image: None,
                prompt: DEFAULT_VIDEO_PROMPT.to_string(),
                aspect_ratio: AspectRatio::default(),
            },
        }
    }
}

/// Work handed to the generation service
#[derive(Debug, Clone)]
pub enum GenerationJob {
    Scene {
        characters: Vec<SceneCharacter>,
        prompt: String,
    },
    Edit {
        image: UploadedImage,
        prompt: String,
    },
    Video {
        image: UploadedImage,
        prompt: String,
        aspect_ratio: AspectRatio,
    },
}

impl GenerationJob {
    /// Call the service; errors are flattened to their display message
    pub async fn run(
        self,
        service: &dyn GenerationService,
        on_progress: ProgressFn<'_>,
    ) -> Result<GeneratedContent, String> {
        let outcome = match self {
            GenerationJob::Scene { characters, prompt } => service
                .compose_scene(&characters, &prompt)
                .await
                .map(|url| GeneratedContent::Image { url }),
            GenerationJob::Edit { image, prompt } => service
                .edit_image(&image, &prompt)
                .await
                .map(|url| GeneratedContent::Image { url }),
            GenerationJob::Video {
                image,
                prompt,
                aspect_ratio,
            } => service
                .generate_video(&image, &prompt, aspect_ratio, on_progress)
                .await
                .map(|url| GeneratedContent::Video { url }),
        };

        outcome.map_err(|err| {
            tracing::error!("Generation failed: {}", err);
            err.to_string()
        })
    }
}

/// A started generation: the ticket fences its completion
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub ticket: Ticket,
    pub job: GenerationJob,
}

#[derive(Debug, Default)]
pub struct Studio {
    library: Library,
    selection: SelectionOrder,
    active_tool: ToolType,
    generation: GenerationState,
    pub forms: ToolForms,
}

impl Studio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn selection(&self) -> &SelectionOrder {
        &self.selection
    }

    pub fn generation(&self) -> &GenerationState {
        &self.generation
    }

    pub fn active_tool(&self) -> ToolType {
        self.active_tool
    }

    /// Switch tools; results and errors stay on the canvas
    pub fn set_active_tool(&mut self, tool: ToolType) {
        self.active_tool = tool;
    }

    pub fn add_character(&mut self, character: Character) {
        self.library.add(character);
    }

    /// Toggle a library character in or out of the layer stack
    pub fn toggle_character(&mut self, id: &CharacterId) -> bool {
        if !self.library.contains(id) {
            tracing::warn!("Ignoring selection of unknown character {}", id);
            return false;
        }
        self.selection.toggle(id);
        true
    }

    /// Drop `dragged` onto `target` in the layer manager
    pub fn move_layer(&mut self, dragged: &CharacterId, target: &CharacterId) -> bool {
        let moved = self.selection.move_in_display_order(dragged, target);
        if moved {
            tracing::debug!("Moved layer {} onto {}", dragged, target);
        }
        moved
    }

    /// Selected characters back-to-front
    pub fn selected_characters(&self) -> Vec<&Character> {
        self.library.resolve(self.selection.ids()).collect()
    }

    /// Selected characters top-to-bottom, as the layer manager lists them
    pub fn layers_top_down(&self) -> Vec<&Character> {
        self.selection
            .display_order()
            .iter()
            .filter_map(|id| self.library.get(id))
            .collect()
    }

    /// Local file behind the current result, if it lives in the media cache
    pub fn result_file(&self) -> Option<PathBuf> {
        let content = self.generation.result()?;
        media::path_from_uri(content.url())
    }

    /// The credential gate reported a selected key
    pub fn select_key(&mut self) {
        self.forms.video.key_selected = true;
    }

    /// Validate the active tool's inputs and enter `Loading`.
    ///
    /// Returns `None` when a request is already running or a precondition
    /// failed (the failure is recorded and the service is not contacted).
    pub fn request_generation(&mut self) -> Option<GenerationRequest> {
        if self.generation.is_loading() {
            tracing::debug!("Generation already in flight, ignoring request");
            return None;
        }

        let tool = self.active_tool;
        let Some(job) = self.build_job(tool) else {
            self.generation.reject(tool.precondition_message());
            return None;
        };

        let ticket = self.generation.begin(tool, tool.loading_message())?;
        tracing::info!("▶️ {} started", tool.label());
        Some(GenerationRequest { ticket, job })
    }

    pub fn report_progress(&mut self, ticket: Ticket, message: String) {
        self.generation.progress(ticket, message);
    }

    /// Apply the outcome of a request
    pub fn complete_generation(&mut self, ticket: Ticket, outcome: Result<GeneratedContent, String>) {
        match outcome {
            Ok(content) => {
                if self.generation.succeed(ticket, content) {
                    tracing::info!("✅ {} finished", ticket.tool().label());
                } else {
                    tracing::debug!("Dropped stale result");
                }
            }
            Err(raw) => {
                let failure = classify_failure(ticket.tool(), &raw);
                if !self.generation.fail(ticket, failure.message) {
                    tracing::debug!("Dropped stale failure");
                    return;
                }
                if failure.reset_credentials {
                    tracing::warn!("🔑 API key rejected, asking for a new one");
                    self.forms.video.key_selected = false;
                }
            }
        }
    }

    fn build_job(&self, tool: ToolType) -> Option<GenerationJob> {
        match tool {
            ToolType::SceneBuilder => {
                let characters: Vec<SceneCharacter> = self
                    .selected_characters()
                    .into_iter()
                    .map(|character| SceneCharacter {
                        name: character.name.clone(),
                        image: character.image.clone(),
                        prompt: character.prompt.clone(),
                    })
                    .collect();

                (!characters.is_empty()).then(|| GenerationJob::Scene {
                    characters,
                    prompt: self.forms.scene.prompt.clone(),
                })
            }
            ToolType::ImageEditor => {
                let form = &self.forms.edit;
                form.image.clone().map(|image| GenerationJob::Edit {
                    image,
                    prompt: form.prompt.clone(),
                })
            }
            ToolType::VideoGenerator => {
                let form = &self.forms.video;
                form.image.clone().map(|image| GenerationJob::Video {
                    image,
                    prompt: form.prompt.clone(),
                    aspect_ratio: form.aspect_ratio,
                })
            }
        }
    }
}
