use iced::alignment::{Horizontal, Vertical};
use iced::mouse;
use iced::widget::{button, center, column, container, image, mouse_area, row, stack, text, Column};
use iced::{Alignment, ContentFit, Element, Length, Theme};

use super::ImageCache;
use crate::state::data::{CharacterId, GeneratedContent};
use crate::state::generation::Phase;
use crate::state::studio::Studio;
use crate::Message;

const LAYER_THUMB: f32 = 32.0;

/// Result area plus the floating layer manager
///
/// Shows, by priority: the loader, the last error, the last result, or the
/// empty state.
pub fn view<'a>(
    studio: &'a Studio,
    images: &'a ImageCache,
    dragged: Option<&'a CharacterId>,
) -> Element<'a, Message> {
    let content: Element<'a, Message> = match studio.generation().phase() {
        Phase::Loading(message) => column![text("⏳").size(40), text(message).size(16)]
            .spacing(12)
            .align_x(Alignment::Center)
            .into(),
        Phase::Failed(error) => container(
            column![text("An Error Occurred").size(20), text(error)].spacing(8),
        )
        .padding(24)
        .style(super::error_panel)
        .into(),
        Phase::Succeeded(result) => result_view(result, images),
        Phase::Idle => column![
            text("🎬").size(64),
            text("Your Scene Awaits").size(28),
            text("Use the controls on the right to build your masterpiece."),
        ]
        .spacing(12)
        .align_x(Alignment::Center)
        .into(),
    };

    let mut layers = stack![center(content).padding(24)];

    // A single layer has nothing to reorder
    if studio.selection().len() > 1 {
        layers = layers.push(
            container(layer_manager(studio, images, dragged))
                .width(Length::Fill)
                .height(Length::Fill)
                .align_x(Horizontal::Right)
                .align_y(Vertical::Bottom)
                .padding(16),
        );
    }

    // Releasing anywhere outside a layer row ends the drag
    mouse_area(layers.width(Length::Fill).height(Length::Fill))
        .on_release(Message::LayerDragCancelled)
        .into()
}

fn result_view<'a>(result: &'a GeneratedContent, images: &'a ImageCache) -> Element<'a, Message> {
    let media: Element<'a, Message> = match result {
        GeneratedContent::Image { url } => match images.get(url) {
            Some(handle) => image(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => text(url.as_str()).into(),
        },
        GeneratedContent::Video { url } => column![
            text("🎞️").size(64),
            text("Your video is ready").size(24),
            text(url.as_str()).size(12),
        ]
        .spacing(8)
        .align_x(Alignment::Center)
        .into(),
    };

    let actions = row![
        button(text("Open")).on_press(Message::OpenResult),
        button(text("Save As...")).style(button::secondary).on_press(Message::SaveResult),
    ]
    .spacing(8);

    column![media, actions]
        .spacing(12)
        .align_x(Alignment::Center)
        .into()
}

fn layer_manager<'a>(
    studio: &'a Studio,
    images: &'a ImageCache,
    dragged: Option<&'a CharacterId>,
) -> Element<'a, Message> {
    let rows = studio.layers_top_down().into_iter().map(|character| -> Element<'a, Message> {
        let is_dragged = dragged == Some(&character.id);

        let thumb: Element<'a, Message> = match images.get(character.image.as_str()) {
            Some(handle) => image(handle.clone())
                .width(Length::Fixed(LAYER_THUMB))
                .height(Length::Fixed(LAYER_THUMB))
                .content_fit(ContentFit::Cover)
                .into(),
            None => text("•").into(),
        };

        let entry = container(
            row![thumb, text(character.name.as_str()).size(14)]
                .spacing(8)
                .align_y(Alignment::Center),
        )
        .padding(6)
        .width(Length::Fill)
        .style(move |theme: &Theme| layer_row(theme, is_dragged));

        mouse_area(entry)
            .on_press(Message::LayerDragStarted(character.id.clone()))
            .on_release(Message::LayerDropped(character.id.clone()))
            .interaction(mouse::Interaction::Grab)
            .into()
    });

    container(
        column![
            text("LAYERS (TOP TO BOTTOM)").size(11),
            Column::with_children(rows).spacing(6),
            text("Drag to reorder layers.").size(11),
        ]
        .spacing(8),
    )
    .width(Length::Fixed(200.0))
    .padding(12)
    .style(super::card)
    .into()
}

fn layer_row(theme: &Theme, is_dragged: bool) -> container::Style {
    let palette = theme.extended_palette();
    let background = if is_dragged {
        palette.primary.weak.color
    } else {
        palette.background.weak.color
    };

    container::Style {
        background: Some(background.into()),
        border: iced::Border {
            radius: 6.0.into(),
            ..iced::Border::default()
        },
        ..container::Style::default()
    }
}
