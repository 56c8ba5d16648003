// SPDX-License-Identifier: MPL-2.0

//! GStreamer capture pipeline feeding a preview surface
//!
//! The pipeline decodes whatever the source produces and converts it to
//! packed RGBA, which both the preview and the barcode detector consume.

use super::types::*;
use crate::constants::{pipeline, timing};
use crate::permission::portal;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);
static DROPPED_FRAMES: AtomicU64 = AtomicU64::new(0);

/// Build the `gst-launch` style description for a device
///
/// `remote_fd` is the PipeWire connection granted by the camera portal; without
/// it `pipewiresrc` connects to the session's PipeWire daemon directly.
pub fn pipeline_description(
    backend: CameraBackendType,
    device: &CameraDevice,
    remote_fd: Option<RawFd>,
) -> String {
    let mut source = backend.source_element().to_string();
    match backend {
        CameraBackendType::PipeWire => {
            if let Some(fd) = remote_fd {
                source.push_str(&format!(" fd={}", fd));
            }
            if !device.path.is_empty() {
                source.push_str(&format!(" target-object={}", device.path));
            }
        }
        CameraBackendType::V4l2 => source.push_str(&format!(" device={}", device.path)),
    }

    format!(
        "{source} ! decodebin ! videoconvert ! video/x-raw,format={format} ! \
         appsink name=sink",
        format = pipeline::OUTPUT_FORMAT
    )
}

/// A running capture pipeline
///
/// Frames are pushed into the surface channel with `try_send`; when the
/// consumer lags, frames are dropped rather than queued.
pub struct CapturePipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
}

impl CapturePipeline {
    /// Create the pipeline and set it to PLAYING
    pub fn start(
        backend: CameraBackendType,
        device: &CameraDevice,
        surface: &PreviewSurface,
    ) -> BackendResult<Self> {
        if surface.is_closed() {
            return Err(BackendError::SurfaceClosed);
        }

        gstreamer::init().map_err(|e| BackendError::InitializationFailed(e.to_string()))?;
        if gstreamer::ElementFactory::find(backend.source_element()).is_none() {
            return Err(BackendError::NotAvailable(format!(
                "GStreamer element {} is not installed",
                backend.source_element()
            )));
        }

        let remote_fd = match backend {
            CameraBackendType::PipeWire => portal::pipewire_remote_fd(),
            CameraBackendType::V4l2 => None,
        };
        let description = pipeline_description(backend, device, remote_fd);
        info!(device = %device.name, %backend, pipeline = %description, "Creating capture pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| {
                BackendError::InitializationFailed("Launch description is not a pipeline".into())
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| {
                BackendError::InitializationFailed("Failed to cast appsink".to_string())
            })?;

        appsink.set_property("emit-signals", true);
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let frame_sender = surface.sender();
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_start = Instant::now();
                    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);

                    let sample = appsink.pull_sample().map_err(|e| {
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            error!(frame = frame_num, error = ?e, "Failed to pull sample");
                        }
                        gstreamer::FlowError::Eos
                    })?;

                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;

                    let buffer = sample.buffer_owned().ok_or(gstreamer::FlowError::Error)?;
                    if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
                        debug!(frame = frame_num, "Skipping corrupted buffer");
                        return Ok(gstreamer::FlowSuccess::Ok);
                    }

                    let mapped = buffer
                        .into_mapped_buffer_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame = CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        stride: video_info.stride()[0] as u32,
                        data: FrameData::from_mapped_buffer(mapped),
                        captured_at: frame_start,
                    };

                    let mut sender = frame_sender.clone();
                    match sender.try_send(frame) {
                        Ok(()) => {
                            if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                                debug!(
                                    frame = frame_num,
                                    width = video_info.width(),
                                    height = video_info.height(),
                                    dropped = DROPPED_FRAMES.load(Ordering::Relaxed),
                                    "Frame delivered"
                                );
                            }
                        }
                        Err(e) if e.is_disconnected() => {
                            debug!("Preview surface gone, ending stream");
                            return Err(gstreamer::FlowError::Eos);
                        }
                        Err(_) => {
                            DROPPED_FRAMES.fetch_add(1, Ordering::Relaxed);
                        }
                    }

                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        pipeline.set_state(gstreamer::State::Playing).map_err(|e| {
            BackendError::InitializationFailed(format!("Failed to start pipeline: {}", e))
        })?;

        let (result, state, pending) = pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");
        if result.is_err() {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(BackendError::InitializationFailed(format!(
                "Pipeline failed to reach PLAYING for {}",
                device.name
            )));
        }
        if state != gstreamer::State::Playing {
            warn!(?state, "Pipeline is not in PLAYING state yet");
        }

        Ok(Self { pipeline, appsink })
    }

    /// Stop the pipeline and release the camera
    pub fn stop(self) -> BackendResult<()> {
        info!("Stopping capture pipeline");
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        self.pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| BackendError::Other(format!("Failed to stop pipeline: {}", e)))?;

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        if let Err(e) = result {
            debug!(error = ?e, state = ?state, "Pipeline state change had issues");
        }
        Ok(())
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}
