// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The main `update()` function acts as a dispatcher, while specific handlers
//! are implemented in the `handlers` submodules organized by functional domain.
//!
//! # Handler Modules
//!
//! - `handlers::ui`: navigation, context pages, toasts, closing
//! - `handlers::scanner`: permission, surface, frames, detections, clear, flash
//! - `handlers::system`: configuration, camera selection, result actions

use crate::app::state::{AppModel, Message};
use cosmic::Task;

impl AppModel {
    /// Main message handler - routes messages to appropriate handler methods.
    pub fn update(&mut self, message: Message) -> Task<cosmic::Action<Message>> {
        match message {
            // ===== UI Navigation =====
            Message::LaunchUrl(url) => self.handle_launch_url(url),
            Message::ToggleContextPage(page) => self.handle_toggle_context_page(page),

            // ===== Settings =====
            Message::UpdateConfig(config) => self.handle_update_config(config),
            Message::SetAppTheme(index) => self.handle_set_app_theme(index),
            Message::SelectBackend(index) => self.handle_select_backend(index),
            Message::SelectCamera(index) => self.handle_select_camera(index),
            Message::SetMirrorPreview(mirror) => self.handle_set_mirror_preview(mirror),

            // ===== Camera lifecycle =====
            Message::CamerasEnumerated(cameras) => self.handle_cameras_enumerated(cameras),
            Message::PermissionResult(response) => self.handle_permission_result(response),
            Message::SurfaceCreated(surface) => self.handle_surface_created(surface),
            Message::SurfaceDestroyed => self.handle_surface_destroyed(),
            Message::CameraFrame(frame) => self.handle_camera_frame(frame),

            // ===== Scanning =====
            Message::DetectionsReady(batch) => self.handle_detections_ready(batch),
            Message::ClearResult => self.handle_clear_result(),
            Message::ToggleFlash => self.handle_toggle_flash(),
            Message::CopyResult => self.handle_copy_result(),
            Message::OpenResult => self.handle_open_result(),

            // ===== Notices =====
            Message::CloseToast(id) => self.handle_close_toast(id),
            Message::CloseScreen => self.handle_close_screen(),
            Message::Noop => Task::none(),
        }
    }
}
