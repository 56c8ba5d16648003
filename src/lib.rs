// SPDX-License-Identifier: MPL-2.0

//! COSMIC Scanner - A barcode and QR code scanner for the COSMIC desktop environment
//!
//! This library provides the scanner screen and everything it drives:
//! camera permission, capture sessions, barcode detection and the torch.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: COSMIC application (window, settings, notices)
//! - [`screen`]: The scanner screen controller shared by every front end
//! - [`backends`]: Camera capture backends (PipeWire and V4L2 via GStreamer)
//! - [`detector`]: Barcode detection on camera frames and images
//! - [`permission`]: Camera permission services (portal and device nodes)
//! - [`flash`]: Torch control
//! - [`terminal`]: Terminal front end
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! // This is a GUI application, typically run via:
//! // cosmic-scanner
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod detector;
pub mod errors;
pub mod flash;
pub mod i18n;
pub mod permission;
pub mod screen;
pub mod terminal;

// Re-export commonly used types
pub use app::{AppModel, Message};
pub use config::Config;
pub use detector::{Barcode, BarcodeDetector, Symbology};
pub use errors::{AppResult, ScannerError};
pub use screen::ScannerScreen;
