// SPDX-License-Identifier: GPL-3.0-only

//! Application state types

use crate::backends::camera::{CameraDevice, CameraFrame, PreviewSurface};
use crate::config::Config;
use crate::detector::DetectionBatch;
use crate::permission::PermissionResponse;
use crate::screen::ScannerScreen;
use cosmic::cosmic_config;
use cosmic::widget::about::About;
use cosmic::widget::toaster::{ToastId, Toasts};
use std::sync::Arc;
use std::time::Instant;

/// The context page to display in the context drawer
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ContextPage {
    #[default]
    About,
    Settings,
}

/// The application model stores app-specific state used to describe its interface and
/// drive its logic.
pub struct AppModel {
    /// Application state which is managed by the COSMIC runtime.
    pub core: cosmic::Core,
    /// Display a context drawer with the designated page if defined.
    pub context_page: ContextPage,
    pub about: About,
    pub config: Config,
    pub config_handler: Option<cosmic_config::Config>,

    /// Created once cameras are enumerated
    pub screen: Option<ScannerScreen>,
    pub available_cameras: Vec<CameraDevice>,
    pub current_camera_index: usize,
    pub camera_dropdown_options: Vec<String>,
    /// Live preview surface, shared with whichever screen is active
    pub surface: Option<PreviewSurface>,

    /// Latest frame shown in the preview
    pub current_frame: Option<Arc<CameraFrame>>,
    /// Image handle built from `current_frame`
    pub preview: Option<cosmic::widget::image::Handle>,
    pub last_detection_time: Option<Instant>,
    pub detection_in_flight: bool,

    pub toasts: Toasts<Message>,
    /// Dropdown options (cached for UI)
    pub theme_dropdown_options: Vec<String>,
    pub backend_dropdown_options: Vec<String>,
}

/// Messages emitted by the application and its widgets.
#[derive(Debug, Clone)]
pub enum Message {
    // ===== UI Navigation =====
    LaunchUrl(String),
    ToggleContextPage(ContextPage),

    // ===== Settings =====
    UpdateConfig(Config),
    SetAppTheme(usize),
    SelectBackend(usize),
    SelectCamera(usize),
    SetMirrorPreview(bool),

    // ===== Camera lifecycle =====
    CamerasEnumerated(Vec<CameraDevice>),
    PermissionResult(PermissionResponse),
    SurfaceCreated(PreviewSurface),
    SurfaceDestroyed,
    CameraFrame(Arc<CameraFrame>),

    // ===== Scanning =====
    DetectionsReady(DetectionBatch),
    ClearResult,
    ToggleFlash,
    CopyResult,
    OpenResult,

    // ===== Notices =====
    CloseToast(ToastId),
    CloseScreen,
    Noop,
}
