// SPDX-License-Identifier: GPL-3.0-only

//! Camera discovery
//!
//! V4L2 nodes are listed through the `v4l` crate and filtered to real capture
//! devices. PipeWire sources come from the GStreamer device monitor; when it
//! finds nothing, PipeWire's own default camera is offered.

use super::types::{CameraBackendType, CameraDevice};
use gstreamer::prelude::*;
use tracing::{debug, info, warn};
use v4l::capability::Flags;

/// Enumerate cameras for the given backend
pub fn enumerate(backend: CameraBackendType) -> Vec<CameraDevice> {
    let cameras = match backend {
        CameraBackendType::PipeWire => enumerate_pipewire_cameras(),
        CameraBackendType::V4l2 => enumerate_v4l2_cameras(),
    };
    info!(%backend, count = cameras.len(), "Enumerated cameras");
    cameras
}

/// V4L2 capture devices, sorted by node index
pub fn enumerate_v4l2_cameras() -> Vec<CameraDevice> {
    let mut nodes = v4l::context::enum_devices();
    nodes.sort_by_key(|node| node.index());

    nodes
        .into_iter()
        .filter_map(|node| {
            let path = node.path().to_string_lossy().to_string();
            let device = match v4l::Device::with_path(&path) {
                Ok(device) => device,
                Err(e) => {
                    debug!(path, error = %e, "Skipping unopenable V4L2 node");
                    return None;
                }
            };
            let caps = device.query_caps().ok()?;
            if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                debug!(path, card = %caps.card, "Skipping non-capture node");
                return None;
            }

            Some(CameraDevice {
                name: caps.card.clone(),
                path: path.clone(),
                v4l2_path: Some(path),
            })
        })
        .collect()
}

/// PipeWire video sources, or the PipeWire default camera
pub fn enumerate_pipewire_cameras() -> Vec<CameraDevice> {
    if let Err(e) = gstreamer::init() {
        warn!(error = %e, "GStreamer init failed");
        return Vec::new();
    }

    let monitor = gstreamer::DeviceMonitor::new();
    monitor.add_filter(Some("Video/Source"), None);
    if let Err(e) = monitor.start() {
        debug!(error = %e, "Device monitor unavailable");
        return vec![CameraDevice::pipewire_default()];
    }

    let cameras: Vec<CameraDevice> = monitor
        .devices()
        .iter()
        .filter_map(|device| {
            let props = device.properties()?;
            if props.get::<String>("device.api").ok().as_deref() != Some("pipewire") {
                return None;
            }
            let serial = props.get::<String>("object.serial").ok()?;
            Some(CameraDevice {
                name: device.display_name().to_string(),
                path: serial,
                v4l2_path: props.get::<String>("api.v4l2.path").ok(),
            })
        })
        .collect();
    monitor.stop();

    if cameras.is_empty() {
        info!("Using PipeWire auto-selection (default camera)");
        return vec![CameraDevice::pipewire_default()];
    }
    cameras
}
