// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for scanning
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Scanning a single code from a camera
//! - Decoding codes from an image file

use scanner::Config;
use scanner::backends::camera::{self, CameraBackendType, CameraDevice, PreviewSurface};
use scanner::constants::{detector::SYMBOLOGIES, pipeline};
use scanner::detector::{Barcode, BarcodeDetector, DetectionBatch};
use scanner::permission;
use scanner::screen::{Effect, ScanResult, ScannerScreen};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// List all available cameras
pub fn list_cameras(backend: CameraBackendType) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    let camera_backend = camera::get_backend(backend);
    if !camera_backend.is_available() {
        println!("The {} backend is not available (missing GStreamer plugin).", backend);
        return Ok(());
    }

    let cameras = camera_backend.enumerate_cameras();
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", backend);
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        if !camera.path.is_empty() {
            println!("      Path: {}", camera.path);
        }
        if let Some(node) = camera.v4l2_path.as_deref()
            && node != camera.path
        {
            println!("      Controls: {}", node);
        }
    }
    println!();

    Ok(())
}

/// Scan with the given camera until a code is read, Ctrl+C or the timeout
pub fn scan(
    config: &Config,
    camera_index: Option<usize>,
    timeout: Option<u64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    gstreamer::init()?;

    let backend = camera::get_backend(config.backend);
    let cameras = backend.enumerate_cameras();
    let device = select_camera(&cameras, camera_index, config.last_camera_path.as_deref())?;
    if !json {
        println!("Using camera: {}", device.name);
    }

    let mut screen = ScannerScreen::new(permission::system_service(), backend, device);
    let effects = screen.start();
    if !settle_effects(&mut screen, effects, json) {
        return Err("Camera permission denied".into());
    }

    let (surface, mut frames) = PreviewSurface::channel(pipeline::FRAME_CHANNEL_CAPACITY);
    screen.surface_created(surface);
    if !screen.is_scanning() {
        return Err("Camera failed to start".into());
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    if !json {
        println!("Scanning... (press Ctrl+C to stop)");
    }

    let detector = screen
        .detector()
        .ok_or("Scanner was not set up")?;
    let interval = config.detection_interval();
    let deadline = timeout.map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut last_detection: Option<Instant> = None;

    while screen.result().is_none() {
        if stop_flag.load(Ordering::SeqCst) {
            screen.surface_destroyed();
            return Err("Stopped before a code was read".into());
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            screen.surface_destroyed();
            return Err("No code found before the timeout".into());
        }

        // Latest frame only
        let mut latest = None;
        while let Ok(frame) = frames.try_recv() {
            latest = Some(frame);
        }

        let due = last_detection.is_none_or(|last| last.elapsed() >= interval);
        match latest {
            Some(frame) if due => {
                last_detection = Some(Instant::now());
                let barcodes = detector.detect_sync(&frame);
                screen.on_detections(DetectionBatch::new(screen.generation(), barcodes));
            }
            _ => std::thread::sleep(Duration::from_millis(10)),
        }
    }

    screen.surface_destroyed();
    if let Some(result) = screen.result() {
        print_result(result, json)?;
    }
    Ok(())
}

/// Decode every code in an image file
pub fn decode_image(path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let image = image::open(path)?.to_luma8();
    let detector = BarcodeDetector::new(SYMBOLOGIES);
    let barcodes = detector.detect_image(&image);

    if json {
        println!("{}", serde_json::to_string_pretty(&barcodes)?);
        return Ok(());
    }

    if barcodes.is_empty() {
        return Err(format!("No codes found in {}", path.display()).into());
    }
    for barcode in &barcodes {
        println!("{}", describe_barcode(barcode));
    }
    Ok(())
}

/// Pick a camera by index, then the configured one, then the first
fn select_camera(
    cameras: &[CameraDevice],
    index: Option<usize>,
    preferred_path: Option<&str>,
) -> Result<CameraDevice, Box<dyn std::error::Error>> {
    match index {
        Some(index) if index < cameras.len() => Ok(cameras[index].clone()),
        Some(index) if cameras.is_empty() => {
            Err(format!("Camera index {} requested but no cameras were found", index).into())
        }
        Some(index) => Err(format!(
            "Camera index {} out of range (0-{})",
            index,
            cameras.len() - 1
        )
        .into()),
        None => Ok(camera::default_device(cameras, preferred_path)
            .unwrap_or_else(CameraDevice::pipewire_default)),
    }
}

/// Apply permission effects; false when the scanner was closed
fn settle_effects(screen: &mut ScannerScreen, effects: Vec<Effect>, json: bool) -> bool {
    let mut pending = effects;
    while !pending.is_empty() {
        let mut next = Vec::new();
        for effect in pending {
            match effect {
                Effect::ShowNotice(notice) => {
                    if !json {
                        eprintln!("{}", notice.message());
                    }
                }
                Effect::RequestPermission(token) => {
                    let response = pollster::block_on(screen.permission_service().request(token));
                    next.extend(screen.on_permission_result(response));
                }
                Effect::CloseScreen => return false,
            }
        }
        pending = next;
    }
    true
}

fn print_result(result: &ScanResult, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let value = serde_json::json!({
            "value": result.text,
            "symbology": result.symbology,
            "link": result.link(),
            "scanned_at": result.scanned_at.to_rfc3339(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", result.text);
    }
    Ok(())
}

fn describe_barcode(barcode: &Barcode) -> String {
    format!(
        "[{}] {} (at {:.2},{:.2})",
        barcode.symbology, barcode.display_value, barcode.region.x, barcode.region.y
    )
}
