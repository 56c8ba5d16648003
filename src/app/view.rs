// SPDX-License-Identifier: GPL-3.0-only

//! Main application view
//!
//! The camera preview fills the window; the result panel sits below it with
//! the decoded text (or the scan hint) and the action buttons. Notices are
//! shown through the toaster wrapping the whole view.

use crate::app::state::{AppModel, Message};
use crate::constants::ui;
use crate::fl;
use cosmic::Element;
use cosmic::iced::{Alignment, Background, Color, Length};
use cosmic::widget;

impl AppModel {
    /// Build the main application view
    pub fn view(&self) -> Element<'_, Message> {
        let content = widget::column()
            .push(self.build_preview())
            .push(self.build_result_panel())
            .width(Length::Fill)
            .height(Length::Fill);

        widget::toaster(&self.toasts, content)
    }

    fn build_preview(&self) -> Element<'_, Message> {
        let inner: Element<'_, Message> = match &self.preview {
            Some(handle) => widget::image(handle.clone())
                .content_fit(cosmic::iced::ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => widget::text(fl!("waiting-for-camera"))
                .class(cosmic::theme::Text::Accent)
                .into(),
        };

        widget::container(inner)
            .center(Length::Fill)
            .style(|_theme| widget::container::Style {
                background: Some(Background::Color(Color::BLACK)),
                ..Default::default()
            })
            .into()
    }

    fn build_result_panel(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();
        let screen = self.screen.as_ref();
        let result = screen.and_then(|s| s.result());

        let mut text_column = widget::column().spacing(spacing.space_xxs);
        match result {
            Some(result) => {
                text_column = text_column
                    .push(widget::text(result.text.clone()).size(ui::RESULT_TEXT_SIZE))
                    .push(
                        widget::text(fl!(
                            "scanned-at",
                            time = result.scanned_at.format("%H:%M:%S").to_string()
                        ))
                        .size(ui::CAPTION_TEXT_SIZE),
                    );
            }
            None => {
                text_column = text_column.push(
                    widget::text(fl!("scan-hint"))
                        .size(ui::RESULT_TEXT_SIZE)
                        .class(cosmic::theme::Text::Accent),
                );
            }
        }

        let clear_button = widget::button::standard(fl!("clear"))
            .width(Length::Fixed(ui::BUTTON_WIDTH))
            .on_press_maybe(result.map(|_| Message::ClearResult));

        let flash_label = screen
            .map(|s| s.flash_label())
            .unwrap_or_else(|| fl!("flash-off"));
        let flash_button = widget::button::standard(flash_label)
            .width(Length::Fixed(ui::BUTTON_WIDTH))
            .on_press_maybe(
                screen
                    .is_some_and(|s| s.is_scanning())
                    .then_some(Message::ToggleFlash),
            );

        let copy_button = widget::button::standard(fl!("copy"))
            .on_press_maybe(result.map(|_| Message::CopyResult));

        let mut buttons = widget::row()
            .push(clear_button)
            .push(flash_button)
            .push(copy_button)
            .spacing(spacing.space_xs)
            .align_y(Alignment::Center);

        if result.and_then(|r| r.link()).is_some() {
            buttons = buttons.push(
                widget::button::suggested(fl!("open-link")).on_press(Message::OpenResult),
            );
        }

        widget::container(
            widget::column()
                .push(text_column)
                .push(buttons)
                .spacing(spacing.space_s),
        )
        .padding(ui::PANEL_PADDING)
        .width(Length::Fill)
        .into()
    }
}
