// SPDX-License-Identifier: MPL-2.0

//! Main application module for the COSMIC scanner
//!
//! # Architecture
//!
//! - `state`: Application state types (AppModel, Message, ContextPage)
//! - `update`: Message dispatch
//! - `handlers`: Message handlers grouped by concern
//! - `view`: Main view rendering
//! - `settings`: Settings drawer
//!
//! The scanning logic itself lives in [`crate::screen::ScannerScreen`];
//! this module feeds it UI events and applies the effects it returns.

mod handlers;
mod settings;
mod state;
mod update;
mod view;

use crate::backends::camera::PreviewSurface;
use crate::config::Config;
use crate::constants::{app_info, pipeline};
use crate::fl;
use cosmic::app::context_drawer;
use cosmic::cosmic_config::{self, CosmicConfigEntry};
use cosmic::iced::Subscription;
use cosmic::iced::futures::{SinkExt, StreamExt};
use cosmic::widget::{self, about::About, toaster::Toasts};
use cosmic::{Element, Task};
pub use state::{AppModel, ContextPage, Message};
use std::sync::Arc;
use tracing::{error, info};

impl cosmic::Application for AppModel {
    /// The async executor that will be used to run your application's commands.
    type Executor = cosmic::executor::Default;

    /// Data that your application receives to its init method.
    type Flags = ();

    /// Messages which the application and its widgets will emit.
    type Message = Message;

    /// Unique identifier in RDNN (reverse domain name notation) format.
    const APP_ID: &'static str = "io.github.cosmic_utils.scanner";

    fn core(&self) -> &cosmic::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut cosmic::Core {
        &mut self.core
    }

    /// Initializes the application with any given flags and startup commands.
    fn init(
        core: cosmic::Core,
        _flags: Self::Flags,
    ) -> (Self, Task<cosmic::Action<Self::Message>>) {
        let about = About::default()
            .name(fl!("app-title"))
            .icon(widget::icon::from_name("camera-photo-symbolic"))
            .version(app_info::version())
            .links([(fl!("repository"), app_info::REPOSITORY)])
            .license(env!("CARGO_PKG_LICENSE"));

        let (config_handler, config) =
            match cosmic_config::Config::new(Self::APP_ID, Config::VERSION) {
                Ok(handler) => {
                    let config = match Config::get_entry(&handler) {
                        Ok(config) => config,
                        Err((errors, config)) => {
                            error!(?errors, "Errors loading config");
                            config
                        }
                    };
                    (Some(handler), config)
                }
                Err(err) => {
                    error!(%err, "Failed to create config handler");
                    (None, Config::default())
                }
            };

        if let Err(e) = gstreamer::init() {
            error!(error = %e, "Failed to initialize GStreamer");
        }

        let app = AppModel {
            core,
            context_page: ContextPage::default(),
            about,
            config,
            config_handler,
            screen: None,
            available_cameras: Vec::new(),
            current_camera_index: 0,
            camera_dropdown_options: Vec::new(),
            surface: None,
            current_frame: None,
            preview: None,
            last_detection_time: None,
            detection_in_flight: false,
            toasts: Toasts::new(Message::CloseToast),
            theme_dropdown_options: vec![
                fl!("theme-system"),
                fl!("theme-dark"),
                fl!("theme-light"),
            ],
            backend_dropdown_options: crate::backends::camera::CameraBackendType::ALL
                .iter()
                .map(|b| b.to_string())
                .collect(),
        };

        let enumerate_task = app.enumerate_cameras_task();
        (app, enumerate_task)
    }

    /// Elements to pack at the end of the header bar.
    fn header_end(&self) -> Vec<Element<'_, Self::Message>> {
        vec![
            widget::button::icon(widget::icon::from_name("preferences-system-symbolic"))
                .on_press(Message::ToggleContextPage(ContextPage::Settings))
                .into(),
            widget::button::icon(widget::icon::from_name("help-about-symbolic"))
                .on_press(Message::ToggleContextPage(ContextPage::About))
                .into(),
        ]
    }

    /// Display a context drawer if the context page is requested.
    fn context_drawer(&self) -> Option<context_drawer::ContextDrawer<'_, Self::Message>> {
        if !self.core.window.show_context {
            return None;
        }

        Some(match self.context_page {
            ContextPage::About => context_drawer::about(
                &self.about,
                |url| Message::LaunchUrl(url.to_string()),
                Message::ToggleContextPage(ContextPage::About),
            ),
            ContextPage::Settings => self.settings_view(),
        })
    }

    /// Describes the interface based on the current state of the application model.
    fn view(&self) -> Element<'_, Self::Message> {
        self.view()
    }

    /// Register subscriptions for this application.
    fn subscription(&self) -> Subscription<Self::Message> {
        let config_sub = self
            .core()
            .watch_config::<Config>(Self::APP_ID)
            .map(|update| Message::UpdateConfig(update.config));

        // One preview surface for the lifetime of the window; screens share it
        let surface_sub = Subscription::run_with_id(
            "preview_surface",
            cosmic::iced::stream::channel(
                pipeline::MESSAGE_CHANNEL_CAPACITY,
                |mut output| async move {
                    let (surface, mut frames) =
                        PreviewSurface::channel(pipeline::FRAME_CHANNEL_CAPACITY);
                    info!(surface = surface.id(), "Preview surface subscription started");
                    if output.send(Message::SurfaceCreated(surface)).await.is_err() {
                        return;
                    }

                    while let Some(frame) = frames.next().await {
                        // Latest frame wins; the preview does not need every one
                        if let Err(e) = output.try_send(Message::CameraFrame(Arc::new(frame)))
                            && e.is_disconnected()
                        {
                            break;
                        }
                    }
                    info!("Preview surface subscription ended");
                },
            ),
        );

        Subscription::batch([config_sub, surface_sub])
    }

    /// Handles messages emitted by the application and its widgets.
    fn update(&mut self, message: Self::Message) -> Task<cosmic::Action<Self::Message>> {
        self.update(message)
    }

    /// Release the camera before the window goes away
    fn on_app_exit(&mut self) -> Option<Self::Message> {
        Some(Message::SurfaceDestroyed)
    }
}
