// SPDX-License-Identifier: MPL-2.0

//! Error types for the scanner
//!
//! Best-effort operations (camera start, torch) return these
//! errors to the caller, which logs them and keeps the screen alive.

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using ScannerError
pub type AppResult<T> = Result<T, ScannerError>;

/// Main scanner error type
#[derive(Debug, Clone)]
pub enum ScannerError {
    /// The camera session could not be started
    CameraStart(BackendError),
    /// Torch could not be switched
    Flash(FlashError),
    /// The screen is missing something an operation needs
    NotReady(&'static str),
}

/// Torch / flash LED errors
#[derive(Debug, Clone)]
pub enum FlashError {
    /// The driver rejected the flash mode change
    ControlFailed {
        /// Device node or LED name
        device: String,
        /// Driver / OS reason
        reason: String,
    },
    /// Reading or writing the LED interface failed
    Io(String),
}

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerError::CameraStart(e) => write!(f, "Camera failed to start: {}", e),
            ScannerError::Flash(e) => write!(f, "Flash error: {}", e),
            ScannerError::NotReady(what) => write!(f, "Not ready: {}", what),
        }
    }
}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashError::ControlFailed { device, reason } => {
                write!(f, "{} rejected torch mode: {}", device, reason)
            }
            FlashError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ScannerError {}
impl std::error::Error for FlashError {}

impl From<BackendError> for ScannerError {
    fn from(err: BackendError) -> Self {
        ScannerError::CameraStart(err)
    }
}

impl From<FlashError> for ScannerError {
    fn from(err: FlashError) -> Self {
        ScannerError::Flash(err)
    }
}

impl From<std::io::Error> for FlashError {
    fn from(err: std::io::Error) -> Self {
        FlashError::Io(err.to_string())
    }
}
