/// Shared data structures for the application state
///
/// These types flow between the studio state, the generation
/// service and the UI layer.

use std::fmt;

use crate::media::ImageRef;

/// Stable identifier of a character in the library
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterId(String);

impl CharacterId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for CharacterId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-authored character in the library
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    /// Unique, stable identifier
    pub id: CharacterId,
    /// Display name (e.g., "Captain Whiskers")
    pub name: String,
    /// Portrait of the character (data URL or cached file URI)
    pub image: ImageRef,
    /// Prompt the character was authored from
    pub prompt: String,
}

/// The three generation tools offered by the studio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolType {
    #[default]
    SceneBuilder,
    ImageEditor,
    VideoGenerator,
}

impl ToolType {
    pub const ALL: [ToolType; 3] = [
        ToolType::SceneBuilder,
        ToolType::ImageEditor,
        ToolType::VideoGenerator,
    ];

    /// Human-readable tool name used in the header tabs
    pub fn label(self) -> &'static str {
        match self {
            ToolType::SceneBuilder => "Scene Builder",
            ToolType::ImageEditor => "Image Editor",
            ToolType::VideoGenerator => "Video Generator",
        }
    }

    /// Status shown on the canvas when a request starts
    pub fn loading_message(self) -> &'static str {
        match self {
            ToolType::SceneBuilder => "Building your scene...",
            ToolType::ImageEditor => "Applying your edits...",
            ToolType::VideoGenerator => "Preparing video generation...",
        }
    }

    /// Error shown when the tool's required input is missing
    pub fn precondition_message(self) -> &'static str {
        match self {
            ToolType::SceneBuilder => "Please select at least one character from the library.",
            ToolType::ImageEditor => "Please upload an image to edit.",
            ToolType::VideoGenerator => "Please upload a starting image for the video.",
        }
    }

    /// Error shown when the service fails without a usable message
    pub fn fallback_error(self) -> &'static str {
        match self {
            ToolType::SceneBuilder => "Failed to generate scene.",
            ToolType::ImageEditor => "Failed to edit image.",
            ToolType::VideoGenerator => "Failed to generate video.",
        }
    }
}

/// Output aspect ratio for video generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Landscape,
    Portrait,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 2] = [AspectRatio::Landscape, AspectRatio::Portrait];

    /// Wire value understood by the generation API
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9 (Landscape)",
            AspectRatio::Portrait => "9:16 (Portrait)",
        }
    }
}

/// Media produced by a generation, replaced wholesale on every run
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedContent {
    Image { url: String },
    Video { url: String },
}

impl GeneratedContent {
    pub fn url(&self) -> &str {
        match self {
            GeneratedContent::Image { url } | GeneratedContent::Video { url } => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = CharacterId::new();
        let b = CharacterId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_content_url_shared_by_both_variants() {
        let image = GeneratedContent::Image { url: "file:///a.png".into() };
        let video = GeneratedContent::Video { url: "file:///b.mp4".into() };

        assert_eq!(image.url(), "file:///a.png");
        assert_eq!(video.url(), "file:///b.mp4");
    }

    #[test]
    fn test_aspect_ratio_wire_values() {
        assert_eq!(AspectRatio::Landscape.as_str(), "16:9");
        assert_eq!(AspectRatio::Portrait.as_str(), "9:16");
        assert_eq!(AspectRatio::default(), AspectRatio::Landscape);
    }
}
