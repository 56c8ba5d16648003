// SPDX-License-Identifier: GPL-3.0-only

//! State and effect types of the scanner screen

use crate::detector::Symbology;
use crate::fl;
use crate::permission::RequestToken;
use chrono::{DateTime, Local};

/// Camera permission as seen by the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    /// Denied, the user may still be asked
    Denied,
    /// The user opted out for good
    DeniedPermanently,
}

/// The decoded barcode currently on display
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub text: String,
    pub symbology: Symbology,
    pub scanned_at: DateTime<Local>,
}

impl ScanResult {
    pub fn new(text: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            text: text.into(),
            symbology,
            scanned_at: Local::now(),
        }
    }

    /// The text when it is a web link
    pub fn link(&self) -> Option<&str> {
        crate::detector::link_of(&self.text)
    }
}

/// Torch state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashState {
    #[default]
    Off,
    Torch,
}

impl FlashState {
    pub fn toggled(self) -> Self {
        match self {
            FlashState::Off => FlashState::Torch,
            FlashState::Torch => FlashState::Off,
        }
    }

    pub fn is_on(self) -> bool {
        self == FlashState::Torch
    }
}

/// Label of the flash button: the action a press performs
pub fn flash_button_label(state: FlashState) -> String {
    match state {
        FlashState::Off => fl!("flash-on"),
        FlashState::Torch => fl!("flash-off"),
    }
}

/// User facing messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Shown before the permission prompt
    PermissionRationale,
    /// The user opted out; the screen closes after this
    PermissionDeniedPermanently { hint: Option<String> },
    /// Restarting the camera after clear failed
    CameraRestartFailed(String),
}

impl Notice {
    /// Localized text
    pub fn message(&self) -> String {
        match self {
            Notice::PermissionRationale => fl!("permission-rationale"),
            Notice::PermissionDeniedPermanently { hint: None } => fl!("permission-denied"),
            Notice::PermissionDeniedPermanently { hint: Some(hint) } => {
                format!("{} {}", fl!("permission-denied"), hint)
            }
            Notice::CameraRestartFailed(reason) => {
                fl!("camera-restart-failed", reason = reason.as_str())
            }
        }
    }
}

/// Work the screen asks its host to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowNotice(Notice),
    /// Issue an asynchronous permission request and feed the answer back
    RequestPermission(RequestToken),
    CloseScreen,
}
