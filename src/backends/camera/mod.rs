// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │   ScannerScreen     │
//! └──────────┬──────────┘
//!            │ create_session
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend      │  ← enumeration, availability
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  CameraSession      │  ← start(surface) / stop / torch
//! └─────────────────────┘
//! ```

pub mod enumeration;
pub mod pipeline;
pub mod session;
pub mod types;
pub mod v4l2_controls;

pub use session::{GstCameraBackend, GstCameraSession};
pub use types::*;

use crate::flash::Torch;
use std::sync::Arc;

/// Camera backend trait
///
/// A backend knows how to find cameras and how to open a capture session on
/// one of them. Opening a session does not touch the device yet.
pub trait CameraBackend: Send + Sync {
    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Create an idle session bound to `device`
    fn create_session(
        &self,
        device: &CameraDevice,
        options: SessionOptions,
    ) -> BackendResult<Box<dyn CameraSession>>;

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;

    /// Check if this backend is available on the current system
    fn is_available(&self) -> bool;
}

/// A capture session on one camera
pub trait CameraSession: Send {
    /// Begin streaming frames into `surface`
    ///
    /// Starting a running session is a no-op.
    fn start(&mut self, surface: &PreviewSurface) -> BackendResult<()>;

    /// Stop streaming and release the device. Idempotent.
    fn stop(&mut self);

    /// Whether frames are currently flowing
    fn is_running(&self) -> bool;

    /// Torch control for the running camera, if it has one
    fn torch(&self) -> Option<Box<dyn Torch>>;

    /// Device this session is bound to
    fn device(&self) -> &CameraDevice;
}

/// Backend instance for a configured backend type
pub fn get_backend(backend_type: CameraBackendType) -> Arc<dyn CameraBackend> {
    Arc::new(GstCameraBackend::new(backend_type))
}

/// Pick the default camera from an enumeration result
pub fn default_device(cameras: &[CameraDevice], preferred_path: Option<&str>) -> Option<CameraDevice> {
    preferred_path
        .and_then(|path| cameras.iter().find(|camera| camera.path == path))
        .or_else(|| cameras.first())
        .cloned()
}
