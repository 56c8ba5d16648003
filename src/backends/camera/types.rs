// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use futures::channel::mpsc;
use gstreamer::buffer::{MappedBuffer, Readable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Frame data storage - either pre-copied bytes or zero-copy GStreamer buffer
///
/// The `Mapped` variant keeps the GStreamer buffer mapped and alive until all
/// references are dropped, so frames can travel to the UI and the detector
/// without copying pixels.
#[derive(Clone)]
pub enum FrameData {
    /// Pre-copied bytes (still images, tests)
    Copied(Arc<[u8]>),
    /// Zero-copy mapped GStreamer buffer
    Mapped(Arc<MappedBuffer<Readable>>),
}

impl FrameData {
    /// Create FrameData from a mapped GStreamer buffer (zero-copy)
    pub fn from_mapped_buffer(buffer: MappedBuffer<Readable>) -> Self {
        FrameData::Mapped(Arc::new(buffer))
    }

    /// Get the length of the frame data in bytes
    pub fn len(&self) -> usize {
        match self {
            FrameData::Copied(data) => data.len(),
            FrameData::Mapped(buf) => buf.len(),
        }
    }

    /// Check if the frame data is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for FrameData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameData::Copied(data) => write!(f, "FrameData::Copied({} bytes)", data.len()),
            FrameData::Mapped(buf) => write!(f, "FrameData::Mapped({} bytes)", buf.len()),
        }
    }
}

impl AsRef<[u8]> for FrameData {
    fn as_ref(&self) -> &[u8] {
        match self {
            FrameData::Copied(data) => data.as_ref(),
            FrameData::Mapped(buf) => buf.as_slice(),
        }
    }
}

impl std::ops::Deref for FrameData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_ref()
    }
}

impl From<Vec<u8>> for FrameData {
    fn from(data: Vec<u8>) -> Self {
        FrameData::Copied(Arc::from(data))
    }
}

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// PipeWire backend (modern Linux standard, required inside Flatpak)
    #[default]
    PipeWire,
    /// Direct V4L2 capture (`v4l2src`)
    V4l2,
}

impl CameraBackendType {
    /// All backends for UI iteration
    pub const ALL: [CameraBackendType; 2] = [CameraBackendType::PipeWire, CameraBackendType::V4l2];

    /// GStreamer source element capturing from this backend
    pub fn source_element(&self) -> &'static str {
        match self {
            CameraBackendType::PipeWire => "pipewiresrc",
            CameraBackendType::V4l2 => "v4l2src",
        }
    }
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::PipeWire => write!(f, "PipeWire"),
            CameraBackendType::V4l2 => write!(f, "V4L2"),
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Human readable name (V4L2 card name or PipeWire description)
    pub name: String,
    /// Capture path: `/dev/videoN` for V4L2, PipeWire target object or empty for default
    pub path: String,
    /// V4L2 node used for controls (focus, flash), if known
    pub v4l2_path: Option<String>,
}

impl CameraDevice {
    /// The PipeWire default camera (PipeWire picks the device)
    pub fn pipewire_default() -> Self {
        Self {
            name: "Default Camera (PipeWire)".to_string(),
            path: String::new(),
            v4l2_path: None,
        }
    }
}

/// Options applied when a capture session is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Enable continuous autofocus when the device supports it
    pub autofocus: bool,
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, `stride` bytes per row
    pub data: FrameData,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// When the frame left the pipeline
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame from owned pixels
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: rgba.into(),
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// RGBA pixels without stride padding
    ///
    /// Rows that fall outside the buffer (truncated frames) are skipped.
    pub fn packed_rgba(&self) -> Vec<u8> {
        let width = self.width as usize;
        let height = self.height as usize;
        let stride = self.stride as usize;

        if stride == width * 4 && self.data.len() >= width * height * 4 {
            return self.data[..width * height * 4].to_vec();
        }

        let mut result = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            let row_start = y * stride;
            let row_end = row_start + width * 4;
            if row_end <= self.data.len() {
                result.extend_from_slice(&self.data[row_start..row_end]);
            }
        }
        result
    }

    /// Luma (BT.601) of the pixel at `(x, y)`, 0 when out of bounds
    pub fn luma(&self, x: u32, y: u32) -> u8 {
        let offset = y as usize * self.stride as usize + x as usize * 4;
        match self.data.get(offset..offset + 3) {
            Some(&[r, g, b]) => {
                ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
            }
            _ => 0,
        }
    }
}

/// Frame receiver type for preview streams
pub type FrameReceiver = mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = mpsc::Sender<CameraFrame>;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// The drawable region that receives live camera frames
///
/// A surface is the sending half of the channel read by the preview consumer
/// (GUI subscription or terminal loop). It exists exactly as long as that
/// consumer is alive; a session can only be started against a live surface.
#[derive(Clone)]
pub struct PreviewSurface {
    id: u64,
    sender: FrameSender,
}

impl PreviewSurface {
    /// Wrap the sending half of a frame channel
    pub fn new(sender: FrameSender) -> Self {
        Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            sender,
        }
    }

    /// Create a surface together with the receiver the consumer reads from
    pub fn channel(capacity: usize) -> (Self, FrameReceiver) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }

    /// Unique id of this surface
    pub fn id(&self) -> u64 {
        self.id
    }

    /// A sender for pipeline callbacks
    pub fn sender(&self) -> FrameSender {
        self.sender.clone()
    }

    /// Whether the consumer has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for PreviewSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSurface")
            .field("id", &self.id)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// The preview surface is gone
    SurfaceClosed,
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::SurfaceClosed => write!(f, "Preview surface is closed"),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
