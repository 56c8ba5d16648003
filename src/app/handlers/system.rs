// SPDX-License-Identifier: GPL-3.0-only

//! System handlers
//!
//! Handles settings, camera discovery and selection, and building the
//! scanner screen for the selected camera.

use crate::app::state::{AppModel, Message};
use crate::backends::camera::{self, CameraBackendType, CameraDevice};
use crate::permission;
use crate::screen::ScannerScreen;
use cosmic::Task;
use cosmic::cosmic_config::CosmicConfigEntry;
use tracing::{error, info, warn};

impl AppModel {
    // =========================================================================
    // Settings Handlers
    // =========================================================================

    pub(crate) fn handle_update_config(
        &mut self,
        config: crate::config::Config,
    ) -> Task<cosmic::Action<Message>> {
        info!("UpdateConfig received");
        self.config = config;
        Task::none()
    }

    pub(crate) fn handle_set_app_theme(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        use crate::config::AppTheme;

        let app_theme = match index {
            0 => AppTheme::System,
            1 => AppTheme::Dark,
            2 => AppTheme::Light,
            _ => return Task::none(),
        };

        info!(?app_theme, "Setting application theme");
        self.config.app_theme = app_theme;
        self.save_config("app theme");

        cosmic::command::set_theme(app_theme.theme())
    }

    pub(crate) fn handle_set_mirror_preview(&mut self, mirror: bool) -> Task<cosmic::Action<Message>> {
        self.config.mirror_preview = mirror;
        self.save_config("mirror preview");
        Task::none()
    }

    pub(crate) fn handle_select_backend(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        let Some(&backend) = CameraBackendType::ALL.get(index) else {
            return Task::none();
        };
        if backend == self.config.backend {
            return Task::none();
        }

        info!(%backend, "Switching camera backend");
        self.config.backend = backend;
        self.config.last_camera_path = None;
        self.save_config("camera backend");

        // The old session must release the device before the new backend probes it
        self.screen = None;
        self.enumerate_cameras_task()
    }

    pub(crate) fn handle_select_camera(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        if index == self.current_camera_index && self.screen.is_some() {
            return Task::none();
        }
        let Some(device) = self.available_cameras.get(index).cloned() else {
            warn!(index, "Camera index out of range");
            return Task::none();
        };

        info!(index, camera = %device.name, "Switching camera");
        self.current_camera_index = index;
        self.open_screen(device)
    }

    // =========================================================================
    // Camera Discovery
    // =========================================================================

    /// Enumerate cameras for the configured backend off the UI thread
    pub(crate) fn enumerate_cameras_task(&self) -> Task<cosmic::Action<Message>> {
        let backend = camera::get_backend(self.config.backend);
        if !backend.is_available() {
            warn!(backend = %self.config.backend, "Camera backend is not available");
        }
        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || backend.enumerate_cameras())
                    .await
                    .unwrap_or_else(|e| {
                        error!(error = %e, "Camera enumeration task failed");
                        Vec::new()
                    })
            },
            |cameras| cosmic::Action::App(Message::CamerasEnumerated(cameras)),
        )
    }

    pub(crate) fn handle_cameras_enumerated(
        &mut self,
        cameras: Vec<CameraDevice>,
    ) -> Task<cosmic::Action<Message>> {
        let device = camera::default_device(&cameras, self.config.last_camera_path.as_deref())
            .unwrap_or_else(|| {
                warn!(backend = %self.config.backend, "No cameras found, using PipeWire default");
                CameraDevice::pipewire_default()
            });

        self.camera_dropdown_options = cameras.iter().map(|c| c.name.clone()).collect();
        self.current_camera_index = cameras.iter().position(|c| *c == device).unwrap_or(0);
        self.available_cameras = cameras;

        self.open_screen(device)
    }

    /// Replace the scanner screen with one bound to `device`
    fn open_screen(&mut self, device: CameraDevice) -> Task<cosmic::Action<Message>> {
        // Release the previous camera first
        self.screen = None;
        self.current_frame = None;
        self.preview = None;
        // A detection still running for the old screen clears detection_in_flight when it lands
        self.last_detection_time = None;

        if !device.path.is_empty() {
            self.config.last_camera_path = Some(device.path.clone());
            self.save_config("last camera");
        }

        let mut screen = ScannerScreen::new(
            permission::system_service(),
            camera::get_backend(self.config.backend),
            device,
        );
        let effects = screen.start();
        if let Some(surface) = self.surface.clone() {
            screen.surface_created(surface);
        }
        self.screen = Some(screen);

        self.apply_effects(effects)
    }

    fn save_config(&self, what: &str) {
        if let Some(handler) = self.config_handler.as_ref()
            && let Err(err) = self.config.write_entry(handler)
        {
            error!(?err, setting = what, "Failed to save setting");
        }
    }
}
