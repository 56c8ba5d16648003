// SPDX-License-Identifier: GPL-3.0-only

//! Scanner screen handlers
//!
//! Permission answers, preview surface lifecycle, camera frames, detection
//! results and the result panel buttons.

use crate::app::state::{AppModel, Message};
use crate::backends::camera::{CameraFrame, PreviewSurface};
use crate::detector::DetectionBatch;
use crate::permission::PermissionResponse;
use cosmic::Task;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

impl AppModel {
    pub(crate) fn handle_permission_result(
        &mut self,
        response: PermissionResponse,
    ) -> Task<cosmic::Action<Message>> {
        let Some(screen) = self.screen.as_mut() else {
            debug!("Permission answer without a screen");
            return Task::none();
        };
        let effects = screen.on_permission_result(response);
        self.apply_effects(effects)
    }

    pub(crate) fn handle_surface_created(
        &mut self,
        surface: PreviewSurface,
    ) -> Task<cosmic::Action<Message>> {
        info!(surface = surface.id(), "Preview surface ready");
        self.surface = Some(surface.clone());
        if let Some(screen) = self.screen.as_mut() {
            screen.surface_created(surface);
        }
        Task::none()
    }

    pub(crate) fn handle_surface_destroyed(&mut self) -> Task<cosmic::Action<Message>> {
        self.surface = None;
        self.current_frame = None;
        self.preview = None;
        if let Some(screen) = self.screen.as_mut() {
            screen.surface_destroyed();
        }
        Task::none()
    }

    pub(crate) fn handle_camera_frame(
        &mut self,
        frame: Arc<CameraFrame>,
    ) -> Task<cosmic::Action<Message>> {
        let Some(screen) = self.screen.as_ref() else {
            return Task::none();
        };
        // Frames still queued after a result was accepted are not shown
        if !screen.is_scanning() {
            return Task::none();
        }

        let rgba = if self.config.mirror_preview {
            mirror_rgba(&frame.packed_rgba(), frame.width, frame.height)
        } else {
            frame.packed_rgba()
        };
        self.preview = Some(cosmic::widget::image::Handle::from_rgba(
            frame.width,
            frame.height,
            rgba,
        ));
        self.current_frame = Some(frame.clone());

        let due = self
            .last_detection_time
            .is_none_or(|last| last.elapsed() >= self.config.detection_interval());
        if self.detection_in_flight || !due {
            return Task::none();
        }
        let Some(detector) = screen.detector() else {
            return Task::none();
        };

        self.detection_in_flight = true;
        self.last_detection_time = Some(Instant::now());
        let generation = screen.generation();
        Task::perform(
            async move { detector.detect(frame).await },
            move |barcodes| {
                cosmic::Action::App(Message::DetectionsReady(DetectionBatch::new(
                    generation, barcodes,
                )))
            },
        )
    }

    pub(crate) fn handle_detections_ready(
        &mut self,
        batch: DetectionBatch,
    ) -> Task<cosmic::Action<Message>> {
        self.detection_in_flight = false;
        if batch.is_empty() {
            return Task::none();
        }
        if let Some(screen) = self.screen.as_mut() {
            screen.on_detections(batch);
        }
        Task::none()
    }

    pub(crate) fn handle_clear_result(&mut self) -> Task<cosmic::Action<Message>> {
        let Some(screen) = self.screen.as_mut() else {
            return Task::none();
        };
        let effects = screen.clear();
        self.last_detection_time = None;
        self.apply_effects(effects)
    }

    pub(crate) fn handle_toggle_flash(&mut self) -> Task<cosmic::Action<Message>> {
        if let Some(screen) = self.screen.as_mut() {
            screen.toggle_flash();
        }
        Task::none()
    }

    pub(crate) fn handle_copy_result(&mut self) -> Task<cosmic::Action<Message>> {
        let Some(result) = self.screen.as_ref().and_then(|s| s.result()) else {
            warn!("Nothing to copy");
            return Task::none();
        };
        info!("Copying scan result to clipboard");
        cosmic::iced::clipboard::write(result.text.clone())
            .map(|_: ()| cosmic::Action::App(Message::Noop))
    }

    pub(crate) fn handle_open_result(&mut self) -> Task<cosmic::Action<Message>> {
        let Some(url) = self
            .screen
            .as_ref()
            .and_then(|s| s.result())
            .and_then(|r| r.link())
            .map(str::to_string)
        else {
            return Task::none();
        };
        self.handle_launch_url(url)
    }
}

/// Flip tightly packed RGBA rows horizontally
fn mirror_rgba(rgba: &[u8], width: u32, height: u32) -> Vec<u8> {
    let row_len = width as usize * 4;
    let mut out = Vec::with_capacity(rgba.len());
    for row in rgba.chunks_exact(row_len).take(height as usize) {
        for pixel in row.chunks_exact(4).rev() {
            out.extend_from_slice(pixel);
        }
    }
    out
}
