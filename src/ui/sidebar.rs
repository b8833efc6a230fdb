use iced::widget::{button, column, container, image, scrollable, text};
use iced::{ContentFit, Element, Length, Theme};
use iced_aw::Wrap;

use super::ImageCache;
use crate::state::data::Character;
use crate::state::studio::Studio;
use crate::Message;

const CARD_SIZE: f32 = 104.0;

/// Character library with a "New Character" action
pub fn view<'a>(studio: &'a Studio, images: &'a ImageCache) -> Element<'a, Message> {
    let library = studio.library();

    let body: Element<'a, Message> = if library.is_empty() {
        column![
            text("Your library is empty."),
            text("Create a new character to get started!").size(13),
        ]
        .spacing(4)
        .padding([32, 0])
        .into()
    } else {
        let cards: Vec<Element<'a, Message>> = library
            .characters()
            .iter()
            .map(|character| {
                let selected = studio.selection().contains(&character.id);
                character_card(character, selected, images)
            })
            .collect();

        scrollable(Wrap::with_elements(cards).spacing(8.0).line_spacing(8.0))
            .height(Length::Fill)
            .into()
    };

    container(
        column![
            text("Character Library").size(18),
            button(text("+ New Character"))
                .width(Length::Fill)
                .padding(10)
                .on_press(Message::OpenCreator),
            body,
        ]
        .spacing(16),
    )
    .width(Length::Fixed(256.0))
    .height(Length::Fill)
    .padding(16)
    .style(super::panel)
    .into()
}

fn character_card<'a>(
    character: &'a Character,
    selected: bool,
    images: &'a ImageCache,
) -> Element<'a, Message> {
    let portrait: Element<'a, Message> = match images.get(character.image.as_str()) {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(CARD_SIZE))
            .height(Length::Fixed(CARD_SIZE))
            .content_fit(ContentFit::Cover)
            .into(),
        None => container(text("?").size(32))
            .center_x(Length::Fixed(CARD_SIZE))
            .center_y(Length::Fixed(CARD_SIZE))
            .into(),
    };

    let style = move |theme: &Theme, status: button::Status| {
        if selected {
            button::primary(theme, status)
        } else {
            button::secondary(theme, status)
        }
    };

    button(column![portrait, text(character.name.as_str()).size(13)].spacing(4))
        .padding(4)
        .style(style)
        .on_press(Message::CharacterToggled(character.id.clone()))
        .into()
}
