use iced::widget::{button, container, horizontal_space, row, text};
use iced::{Alignment, Element, Length, Theme};

use crate::state::data::ToolType;
use crate::Message;

type ButtonStyle = fn(&Theme, button::Status) -> button::Style;

/// App title with one tab per tool
pub fn view(active: ToolType) -> Element<'static, Message> {
    let tabs = ToolType::ALL.iter().fold(row![].spacing(8), |tabs, &tool| {
        let style: ButtonStyle = if tool == active {
            button::primary
        } else {
            button::secondary
        };

        tabs.push(
            button(text(tool.label()))
                .style(style)
                .padding([8, 16])
                .on_press(Message::ToolSelected(tool)),
        )
    });

    container(
        row![text("Character Studio").size(24), horizontal_space(), tabs]
            .align_y(Alignment::Center)
            .padding(16),
    )
    .width(Length::Fill)
    .style(crate::ui::panel)
    .into()
}
