// SPDX-License-Identifier: MPL-2.0

//! GStreamer-backed camera session

use super::pipeline::CapturePipeline;
use super::types::*;
use super::v4l2_controls;
use super::{CameraBackend, CameraSession, enumeration};
use crate::flash::{self, Torch};
use tracing::{debug, info, warn};

/// Camera backend building GStreamer pipelines for one source type
#[derive(Debug, Clone, Copy)]
pub struct GstCameraBackend {
    backend_type: CameraBackendType,
}

impl GstCameraBackend {
    pub fn new(backend_type: CameraBackendType) -> Self {
        Self { backend_type }
    }
}

impl CameraBackend for GstCameraBackend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        enumeration::enumerate(self.backend_type)
    }

    fn create_session(
        &self,
        device: &CameraDevice,
        options: SessionOptions,
    ) -> BackendResult<Box<dyn CameraSession>> {
        if self.backend_type == CameraBackendType::V4l2 && device.path.is_empty() {
            return Err(BackendError::DeviceNotFound(
                "V4L2 capture needs a device path".into(),
            ));
        }
        Ok(Box::new(GstCameraSession {
            backend_type: self.backend_type,
            device: device.clone(),
            options,
            pipeline: None,
        }))
    }

    fn backend_type(&self) -> CameraBackendType {
        self.backend_type
    }

    fn is_available(&self) -> bool {
        if gstreamer::init().is_err() {
            return false;
        }
        gstreamer::ElementFactory::find(self.backend_type.source_element()).is_some()
    }
}

/// A camera session bound to one device
///
/// The pipeline only exists while the session runs. Stopping drops it, which
/// releases the device for other applications.
pub struct GstCameraSession {
    backend_type: CameraBackendType,
    device: CameraDevice,
    options: SessionOptions,
    pipeline: Option<CapturePipeline>,
}

impl CameraSession for GstCameraSession {
    fn start(&mut self, surface: &PreviewSurface) -> BackendResult<()> {
        if self.pipeline.is_some() {
            debug!(device = %self.device.name, "Session already running");
            return Ok(());
        }

        let pipeline = CapturePipeline::start(self.backend_type, &self.device, surface)?;
        self.pipeline = Some(pipeline);

        if self.options.autofocus
            && let Some(path) = self.device.v4l2_path.as_deref()
        {
            let enabled = v4l2_controls::enable_autofocus(path);
            debug!(path, enabled, "Autofocus");
        }

        info!(device = %self.device.name, surface = surface.id(), "Camera session started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.stop() {
                warn!(error = %e, "Failed to stop pipeline cleanly");
            }
            info!(device = %self.device.name, "Camera session stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.pipeline.is_some()
    }

    fn torch(&self) -> Option<Box<dyn Torch>> {
        if !self.is_running() {
            return None;
        }
        flash::find_torch(self.device.v4l2_path.as_deref())
    }

    fn device(&self) -> &CameraDevice {
        &self.device
    }
}

impl Drop for GstCameraSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v4l2_session_requires_path() {
        let backend = GstCameraBackend::new(CameraBackendType::V4l2);
        let result = backend.create_session(
            &CameraDevice::pipewire_default(),
            SessionOptions { autofocus: true },
        );
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
    }

    #[test]
    fn test_new_session_is_idle() {
        let backend = GstCameraBackend::new(CameraBackendType::PipeWire);
        let session = backend
            .create_session(
                &CameraDevice::pipewire_default(),
                SessionOptions { autofocus: false },
            )
            .unwrap();
        assert!(!session.is_running());
        assert!(session.torch().is_none());
        assert_eq!(session.device().path, "");
    }

    #[test]
    fn test_start_rejects_closed_surface() {
        let backend = GstCameraBackend::new(CameraBackendType::PipeWire);
        let mut session = backend
            .create_session(
                &CameraDevice::pipewire_default(),
                SessionOptions { autofocus: false },
            )
            .unwrap();
        let (surface, receiver) = PreviewSurface::channel(1);
        drop(receiver);
        assert!(matches!(
            session.start(&surface),
            Err(BackendError::SurfaceClosed)
        ));
        assert!(!session.is_running());
    }
}
