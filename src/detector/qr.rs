// SPDX-License-Identifier: GPL-3.0-only

//! QR code decoding with rqrr

use super::types::{Barcode, FrameRegion, Symbology, SymbologyFilter};
use image::GrayImage;
use std::time::Instant;
use tracing::{debug, trace};

/// Decode every QR grid in `image`
///
/// `scale`, `frame_width` and `frame_height` map grid bounds back to the
/// source frame for the reported regions.
pub fn decode_grids(
    image: &GrayImage,
    scale: f32,
    frame_width: u32,
    frame_height: u32,
    filter: SymbologyFilter,
) -> Vec<Barcode> {
    if !filter.allows(Symbology::QrCode) || image.width() == 0 || image.height() == 0 {
        return Vec::new();
    }

    let start = Instant::now();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width() as usize,
        image.height() as usize,
        |x, y| image.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    trace!(
        count = grids.len(),
        detection_ms = start.elapsed().as_millis(),
        "QR grid search complete"
    );

    grids
        .into_iter()
        .filter_map(|grid| {
            let (_meta, content) = match grid.decode() {
                Ok(decoded) => decoded,
                Err(e) => {
                    debug!(error = ?e, "Failed to decode QR code");
                    return None;
                }
            };

            let xs = grid.bounds.iter().map(|p| p.x.max(0) as f32);
            let ys = grid.bounds.iter().map(|p| p.y.max(0) as f32);
            let min_x = xs.clone().fold(f32::MAX, f32::min);
            let max_x = xs.fold(0.0, f32::max);
            let min_y = ys.clone().fold(f32::MAX, f32::min);
            let max_y = ys.fold(0.0, f32::max);

            let region = FrameRegion::from_pixels(
                (min_x * scale) as u32,
                (min_y * scale) as u32,
                ((max_x - min_x) * scale) as u32,
                ((max_y - min_y) * scale) as u32,
                frame_width,
                frame_height,
            );

            debug!(content = %content, x = region.x, y = region.y, "Detected QR code");
            Some(Barcode {
                display_value: content,
                symbology: Symbology::QrCode,
                region,
            })
        })
        .collect()
}
