/// New character modal
///
/// A character needs a name and a portrait. The portrait is either an
/// uploaded image or generated from the description by the service.

use iced::widget::{button, column, container, horizontal_space, image, row, text, text_input};
use iced::{Alignment, ContentFit, Element, Length};
use uuid::Uuid;

use super::ImageCache;
use crate::media::ImageRef;
use crate::state::data::{Character, CharacterId};
use crate::{Message, UploadSlot};

const MISSING_FIELDS: &str = "Please provide a name and an image for your character.";
const MISSING_PROMPT: &str = "Describe your character before generating a portrait.";

/// State of the open modal
#[derive(Debug, Clone, Default)]
pub struct CreatorForm {
    pub name: String,
    pub prompt: String,
    pub image: Option<ImageRef>,
    /// A portrait request is in flight
    pub generating: bool,
    pub error: Option<String>,
    /// Identifies this opening of the modal; portraits requested by an
    /// earlier, closed form carry a different token
    token: Uuid,
}

impl CreatorForm {
    pub fn new() -> Self {
        Self {
            token: Uuid::new_v4(),
            ..Self::default()
        }
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    /// Apply a finished portrait request.
    ///
    /// Returns the new portrait when it was applied; outcomes for another
    /// form are ignored.
    pub fn finish_portrait(&mut self, token: Uuid, outcome: Result<String, String>) -> Option<ImageRef> {
        if token != self.token {
            tracing::debug!("Dropped portrait for a closed character form");
            return None;
        }

        self.generating = false;
        match outcome {
            Ok(uri) => {
                let portrait = ImageRef::new(uri);
                self.image = Some(portrait.clone());
                self.error = None;
                Some(portrait)
            }
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }

    /// Validate before asking the service for a portrait
    pub fn portrait_prompt(&self) -> Result<String, &'static str> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(MISSING_PROMPT);
        }
        Ok(prompt.to_string())
    }

    /// Turn the form into a library character
    pub fn build(&self) -> Result<Character, &'static str> {
        let name = self.name.trim();
        let Some(image) = self.image.clone() else {
            return Err(MISSING_FIELDS);
        };
        if name.is_empty() {
            return Err(MISSING_FIELDS);
        }

        Ok(Character {
            id: CharacterId::new(),
            name: name.to_string(),
            image,
            prompt: self.prompt.trim().to_string(),
        })
    }

    pub fn view<'a>(&'a self, images: &'a ImageCache) -> Element<'a, Message> {
        let preview: Element<'a, Message> = match self.image.as_ref().and_then(|i| images.get(i.as_str())) {
            Some(handle) => image(handle.clone())
                .width(Length::Fixed(220.0))
                .height(Length::Fixed(220.0))
                .content_fit(ContentFit::Contain)
                .into(),
            None if self.generating => container(text("⏳ Generating portrait..."))
                .center_x(Length::Fixed(220.0))
                .center_y(Length::Fixed(220.0))
                .into(),
            None => container(text("No image yet").size(13))
                .center_x(Length::Fixed(220.0))
                .center_y(Length::Fixed(220.0))
                .style(super::card)
                .into(),
        };

        let busy = self.generating;

        let mut body = column![
            text("New Character").size(22),
            text_input("Name", &self.name)
                .on_input(Message::CreatorNameChanged)
                .padding(8),
            text_input("Describe your character", &self.prompt)
                .on_input(Message::CreatorPromptChanged)
                .padding(8),
            row![
                preview,
                column![
                    button(text("Upload Image..."))
                        .width(Length::Fill)
                        .on_press_maybe((!busy).then_some(Message::PickUpload(UploadSlot::Character))),
                    button(text("Generate from Prompt"))
                        .width(Length::Fill)
                        .on_press_maybe((!busy).then_some(Message::CreatorGenerate)),
                ]
                .spacing(8)
                .width(Length::Fill),
            ]
            .spacing(12)
            .align_y(Alignment::Start),
        ]
        .spacing(12);

        if let Some(error) = &self.error {
            body = body.push(container(text(error.as_str()).size(13)).padding(8).style(super::error_panel));
        }

        body = body.push(
            row![
                horizontal_space(),
                button(text("Cancel"))
                    .style(button::secondary)
                    .on_press(Message::CloseCreator),
                button(text("Save Character")).on_press_maybe((!busy).then_some(Message::CreatorSave)),
            ]
            .spacing(8),
        );

        container(body)
            .width(Length::Fixed(480.0))
            .padding(24)
            .style(super::card)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> CreatorForm {
        CreatorForm {
            name: "  Captain Whiskers ".to_string(),
            prompt: "A cat in a pirate coat".to_string(),
            image: Some(ImageRef::new("data:image/png;base64,AA==")),
            ..CreatorForm::new()
        }
    }

    #[test]
    fn test_portrait_lands_in_requesting_form() {
        let mut form = CreatorForm::new();
        form.generating = true;

        let portrait = form.finish_portrait(form.token(), Ok("file:///portrait.png".to_string()));

        assert_eq!(portrait, Some(ImageRef::new("file:///portrait.png")));
        assert_eq!(form.image, portrait);
        assert!(!form.generating);
    }

    #[test]
    fn test_late_portrait_does_not_replace_upload_in_reopened_form() {
        let closed = CreatorForm::new();

        let mut reopened = CreatorForm::new();
        let upload = ImageRef::new("data:image/png;base64,AA==");
        reopened.image = Some(upload.clone());

        let applied = reopened.finish_portrait(closed.token(), Ok("file:///late.png".to_string()));

        assert_eq!(applied, None);
        assert_eq!(reopened.image, Some(upload));

        let failed = reopened.finish_portrait(closed.token(), Err("Quota exceeded".to_string()));
        assert_eq!(failed, None);
        assert_eq!(reopened.error, None);
    }

    #[test]
    fn test_failed_portrait_reports_error() {
        let mut form = CreatorForm::new();
        form.generating = true;

        assert_eq!(form.finish_portrait(form.token(), Err("Quota exceeded".to_string())), None);
        assert_eq!(form.error.as_deref(), Some("Quota exceeded"));
        assert!(!form.generating);
    }

    #[test]
    fn test_build_trims_name() {
        let character = complete_form().build().unwrap();
        assert_eq!(character.name, "Captain Whiskers");
        assert_eq!(character.prompt, "A cat in a pirate coat");
    }

    #[test]
    fn test_build_requires_name_and_image() {
        let mut form = complete_form();
        form.name = "   ".to_string();
        assert_eq!(form.build().unwrap_err(), MISSING_FIELDS);

        let mut form = complete_form();
        form.image = None;
        assert_eq!(form.build().unwrap_err(), MISSING_FIELDS);
    }

    #[test]
    fn test_each_build_gets_a_fresh_id() {
        let form = complete_form();
        assert_ne!(form.build().unwrap().id, form.build().unwrap().id);
    }

    #[test]
    fn test_portrait_needs_a_prompt() {
        let mut form = complete_form();
        assert_eq!(form.portrait_prompt().unwrap(), "A cat in a pirate coat");

        form.prompt = String::new();
        assert_eq!(form.portrait_prompt().unwrap_err(), MISSING_PROMPT);
    }
}
