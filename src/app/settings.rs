// SPDX-License-Identifier: MPL-2.0

//! Settings drawer view

use crate::app::state::{AppModel, ContextPage, Message};
use crate::backends::camera::CameraBackendType;
use crate::config::AppTheme;
use crate::constants::app_info;
use crate::fl;
use cosmic::Element;
use cosmic::app::context_drawer;
use cosmic::iced::{Alignment, Length};
use cosmic::widget;

impl AppModel {
    /// Create the settings view for the context drawer
    pub fn settings_view(&self) -> context_drawer::ContextDrawer<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let theme_index = match self.config.app_theme {
            AppTheme::System => 0,
            AppTheme::Dark => 1,
            AppTheme::Light => 2,
        };
        let theme_dropdown = widget::dropdown(
            &self.theme_dropdown_options,
            Some(theme_index),
            Message::SetAppTheme,
        );

        let backend_index = CameraBackendType::ALL
            .iter()
            .position(|b| *b == self.config.backend);
        let backend_dropdown = widget::dropdown(
            &self.backend_dropdown_options,
            backend_index,
            Message::SelectBackend,
        );

        // Empty when enumeration found nothing and the PipeWire default is used
        let camera_index =
            (!self.camera_dropdown_options.is_empty()).then_some(self.current_camera_index);
        let camera_dropdown = widget::dropdown(
            &self.camera_dropdown_options,
            camera_index,
            Message::SelectCamera,
        );

        let mirror_toggle =
            widget::toggler(self.config.mirror_preview).on_toggle(Message::SetMirrorPreview);

        let heading = |label: String| widget::text(label).size(16).font(cosmic::font::bold());

        let settings_column: Element<'_, Message> = widget::column()
            .push(heading(fl!("appearance")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(theme_dropdown)
            .push(widget::vertical_space().height(spacing.space_s))
            .push(heading(fl!("backend")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(backend_dropdown)
            .push(widget::vertical_space().height(spacing.space_s))
            .push(heading(fl!("camera")))
            .push(widget::vertical_space().height(spacing.space_xxs))
            .push(camera_dropdown)
            .push(widget::vertical_space().height(spacing.space_l))
            .push(widget::divider::horizontal::default())
            .push(widget::vertical_space().height(spacing.space_s))
            .push(
                widget::row()
                    .push(heading(fl!("mirror-preview")))
                    .push(widget::horizontal_space().width(Length::Fill))
                    .push(mirror_toggle)
                    .align_y(Alignment::Center),
            )
            .push(widget::vertical_space().height(spacing.space_l))
            .push(widget::divider::horizontal::default())
            .push(widget::vertical_space().height(spacing.space_s))
            .push(
                widget::text(format!("Version {}", app_info::version()))
                    .size(12)
                    .class(cosmic::theme::Text::Accent),
            )
            .spacing(0)
            .into();

        context_drawer::context_drawer(
            settings_column,
            Message::ToggleContextPage(ContextPage::Settings),
        )
        .title(fl!("settings-title"))
    }
}
