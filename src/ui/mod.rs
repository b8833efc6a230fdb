/// User interface components
///
/// Each module renders one region of the window from the studio state:
/// - `header.rs` - title and tool tabs
/// - `sidebar.rs` - character library
/// - `canvas.rs` - generated media and the layer manager
/// - `controls.rs` - per-tool forms and the API key gate
/// - `creator.rs` - new character modal

pub mod canvas;
pub mod controls;
pub mod creator;
pub mod header;
pub mod sidebar;

use std::collections::HashMap;

use base64::Engine;
use iced::widget::{container, image};
use iced::{Border, Color, Theme};

use crate::media::{ImageRef, MediaSource};

/// Decoded image handles keyed by URI.
///
/// iced re-uploads a texture whenever it sees a new handle, so handles are
/// built once when media enters the app and reused by every `view`.
#[derive(Debug, Default)]
pub struct ImageCache {
    handles: HashMap<String, image::Handle>,
}

impl ImageCache {
    pub fn insert(&mut self, image: &ImageRef) {
        if self.handles.contains_key(image.as_str()) {
            return;
        }

        let handle = match image.source() {
            Ok(MediaSource::File(path)) => image::Handle::from_path(path),
            Ok(MediaSource::Inline { payload, .. }) => {
                match base64::engine::general_purpose::STANDARD.decode(payload) {
                    Ok(bytes) => image::Handle::from_bytes(bytes),
                    Err(err) => {
                        tracing::warn!("Cannot decode inline image: {}", err);
                        return;
                    }
                }
            }
            Err(err) => {
                tracing::warn!("Cannot display image: {}", err);
                return;
            }
        };

        self.handles.insert(image.as_str().to_string(), handle);
    }

    pub fn get(&self, uri: &str) -> Option<&image::Handle> {
        self.handles.get(uri)
    }
}

/// Background for the side panels
pub fn panel(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();
    container::Style {
        background: Some(palette.background.weak.color.into()),
        ..container::Style::default()
    }
}

/// Rounded card with a subtle border
pub fn card(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();
    container::Style {
        background: Some(palette.background.strong.color.into()),
        border: Border {
            color: palette.background.weak.color,
            width: 1.0,
            radius: 8.0.into(),
        },
        ..container::Style::default()
    }
}

/// Red panel used for error messages
pub fn error_panel(_theme: &Theme) -> container::Style {
    container::Style {
        text_color: Some(Color::from_rgb(1.0, 0.65, 0.65)),
        background: Some(Color::from_rgba(0.5, 0.1, 0.1, 0.5).into()),
        border: Border {
            radius: 8.0.into(),
            ..Border::default()
        },
        ..container::Style::default()
    }
}
