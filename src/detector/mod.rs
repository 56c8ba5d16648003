// SPDX-License-Identifier: MPL-2.0

//! Barcode detection on camera frames
//!
//! A [`BarcodeDetector`] is configured once with the symbologies it reports.
//! Analysis is CPU bound and runs on the blocking thread pool.
//!
//! QR codes go through rqrr; every other format goes through rxing.

pub mod luma;
pub mod multi_format;
pub mod qr;
pub mod types;

pub use types::{Barcode, DetectionBatch, FrameRegion, Symbology, SymbologyFilter, link_of};

use crate::backends::camera::CameraFrame;
use crate::constants::detector::MAX_DIMENSION;
use image::GrayImage;
use std::sync::Arc;
use tracing::warn;

/// Barcode detector
#[derive(Debug, Clone)]
pub struct BarcodeDetector {
    filter: SymbologyFilter,
    max_dimension: u32,
}

impl BarcodeDetector {
    pub fn new(filter: SymbologyFilter) -> Self {
        Self {
            filter,
            max_dimension: MAX_DIMENSION,
        }
    }

    /// Frames are downscaled so neither side exceeds `max_dimension`
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension.max(1);
        self
    }

    pub fn filter(&self) -> SymbologyFilter {
        self.filter
    }

    /// Analyze a frame off the async runtime
    pub async fn detect(&self, frame: Arc<CameraFrame>) -> Vec<Barcode> {
        let detector = self.clone();
        tokio::task::spawn_blocking(move || detector.detect_sync(&frame))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Barcode detection task panicked");
                Vec::new()
            })
    }

    /// Analyze a frame on the calling thread
    pub fn detect_sync(&self, frame: &CameraFrame) -> Vec<Barcode> {
        let (luma, scale) = luma::luma_plane(frame, self.max_dimension);
        self.decode(&luma, scale, frame.width, frame.height)
    }

    /// Analyze a still grayscale image at full resolution
    pub fn detect_image(&self, image: &GrayImage) -> Vec<Barcode> {
        self.decode(image, 1.0, image.width(), image.height())
    }

    fn decode(&self, image: &GrayImage, scale: f32, width: u32, height: u32) -> Vec<Barcode> {
        let mut barcodes = qr::decode_grids(image, scale, width, height, self.filter);
        for barcode in multi_format::decode_barcodes(image, scale, width, height, self.filter) {
            // rxing also reads QR codes rqrr already reported
            let duplicate = barcodes.iter().any(|known| {
                known.symbology == barcode.symbology && known.display_value == barcode.display_value
            });
            if !duplicate {
                barcodes.push(barcode);
            }
        }
        barcodes
    }
}
