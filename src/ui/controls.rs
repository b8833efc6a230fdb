use iced::widget::{button, column, container, row, scrollable, text, text_input, Column};
use iced::{Alignment, Element, Length, Theme};
use iced_aw::Wrap;

use crate::media::UploadedImage;
use crate::state::data::{AspectRatio, ToolType};
use crate::state::studio::Studio;
use crate::{Message, UploadSlot};

type ButtonStyle = fn(&Theme, button::Status) -> button::Style;

/// Right-hand panel with the active tool's form
pub fn view<'a>(studio: &'a Studio, key_input: &'a str, notice: Option<&'a str>) -> Element<'a, Message> {
    let busy = studio.generation().is_loading();

    let form = match studio.active_tool() {
        ToolType::SceneBuilder => scene_builder(studio, busy),
        ToolType::ImageEditor => image_editor(studio, busy),
        ToolType::VideoGenerator if !studio.forms.video.key_selected => key_selector(key_input),
        ToolType::VideoGenerator => video_generator(studio, busy),
    };

    let mut panel = column![form].spacing(16);
    if let Some(notice) = notice {
        panel = panel.push(text(notice).size(12));
    }

    container(scrollable(panel))
        .width(Length::Fixed(320.0))
        .height(Length::Fill)
        .padding(16)
        .style(super::panel)
        .into()
}

fn scene_builder(studio: &Studio, busy: bool) -> Element<'_, Message> {
    let selected = studio.selected_characters();

    let chips: Element<'_, Message> = if selected.is_empty() {
        text("Select from library").size(13).into()
    } else {
        let chips: Vec<Element<'_, Message>> = selected
            .into_iter()
            .map(|character| {
                container(text(character.name.as_str()).size(13))
                    .padding([4, 8])
                    .style(super::card)
                    .into()
            })
            .collect();

        Wrap::with_elements(chips).spacing(6.0).line_spacing(6.0).into()
    };

    let can_generate = !studio.selection().is_empty() && !busy;

    column![
        text("Scene Builder").size(20),
        labelled("Selected Characters", chips),
        labelled(
            "Scene Prompt",
            text_input(
                "e.g., A wizard teaching a young apprentice in a mystical library...",
                &studio.forms.scene.prompt,
            )
            .on_input(Message::ScenePromptChanged)
            .padding(8)
            .into(),
        ),
        generate_button("Generate Scene", can_generate),
    ]
    .spacing(16)
    .into()
}

fn image_editor(studio: &Studio, busy: bool) -> Element<'_, Message> {
    let form = &studio.forms.edit;

    column![
        text("Image Editor").size(20),
        labelled("Upload Image", upload_picker(UploadSlot::EditImage, form.image.as_ref())),
        labelled(
            "Edit Prompt",
            text_input("e.g., Add a futuristic helmet", &form.prompt)
                .on_input(Message::EditPromptChanged)
                .padding(8)
                .into(),
        ),
        generate_button("Generate Edit", form.image.is_some() && !busy),
    ]
    .spacing(16)
    .into()
}

fn video_generator(studio: &Studio, busy: bool) -> Element<'_, Message> {
    let form = &studio.forms.video;

    let ratios = AspectRatio::ALL.iter().fold(row![].spacing(8), |ratios, &ratio| {
        let style: ButtonStyle = if ratio == form.aspect_ratio {
            button::primary
        } else {
            button::secondary
        };
        ratios.push(
            button(text(ratio.label()).size(13))
                .style(style)
                .on_press(Message::AspectRatioSelected(ratio)),
        )
    });

    column![
        text("Video Generator").size(20),
        labelled("Starting Image", upload_picker(UploadSlot::VideoImage, form.image.as_ref())),
        labelled(
            "Video Prompt",
            text_input("Describe the motion", &form.prompt)
                .on_input(Message::VideoPromptChanged)
                .padding(8)
                .into(),
        ),
        labelled("Aspect Ratio", ratios.into()),
        generate_button("Generate Video", form.image.is_some() && !busy),
    ]
    .spacing(16)
    .into()
}

/// Gate shown before the video tool can be used
fn key_selector(key_input: &str) -> Element<'_, Message> {
    column![
        text("API Key Required").size(20),
        text("Video generation uses a paid model. Select the API key to bill before continuing.")
            .size(13),
        text_input("Paste your API key", key_input)
            .on_input(Message::ApiKeyInputChanged)
            .on_submit(Message::ApiKeySelected)
            .secure(true)
            .padding(8),
        button(text("Select API Key"))
            .width(Length::Fill)
            .padding(10)
            .on_press(Message::ApiKeySelected),
    ]
    .spacing(12)
    .into()
}

fn upload_picker(slot: UploadSlot, image: Option<&UploadedImage>) -> Element<'_, Message> {
    let name = image.map_or("No file chosen", |image| image.name.as_str());

    row![
        button(text("Choose Image...").size(13)).on_press(Message::PickUpload(slot)),
        text(name).size(13),
    ]
    .spacing(8)
    .align_y(Alignment::Center)
    .into()
}

fn generate_button(label: &'static str, enabled: bool) -> Element<'static, Message> {
    button(text(label))
        .width(Length::Fill)
        .padding(10)
        .on_press_maybe(enabled.then_some(Message::Generate))
        .into()
}

fn labelled<'a>(label: &'a str, field: Element<'a, Message>) -> Element<'a, Message> {
    Column::new()
        .push(text(label).size(13))
        .push(field)
        .spacing(4)
        .into()
}
