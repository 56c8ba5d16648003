// SPDX-License-Identifier: GPL-3.0-only

//! Linear and stacked barcode decoding with rxing
//!
//! rxing runs the ZXing multi-format readers over the whole luma plane, which
//! covers the product codes (EAN, UPC) and the industrial ones (Code 128,
//! ITF, DataBar) as well as the other 2D matrix formats.

use super::types::{Barcode, FrameRegion, Symbology, SymbologyFilter};
use image::GrayImage;
use rxing::BarcodeFormat;
use std::time::Instant;
use tracing::{debug, trace};

/// Symbology of an rxing result, `None` for formats we do not report
pub fn symbology_of(format: &BarcodeFormat) -> Option<Symbology> {
    let symbology = match format {
        BarcodeFormat::QR_CODE => Symbology::QrCode,
        BarcodeFormat::DATA_MATRIX => Symbology::DataMatrix,
        BarcodeFormat::AZTEC => Symbology::Aztec,
        BarcodeFormat::PDF_417 => Symbology::Pdf417,
        BarcodeFormat::MAXICODE => Symbology::MaxiCode,
        BarcodeFormat::EAN_13 => Symbology::Ean13,
        BarcodeFormat::EAN_8 => Symbology::Ean8,
        BarcodeFormat::UPC_A => Symbology::UpcA,
        BarcodeFormat::UPC_E => Symbology::UpcE,
        BarcodeFormat::CODE_128 => Symbology::Code128,
        BarcodeFormat::CODE_39 => Symbology::Code39,
        BarcodeFormat::CODE_93 => Symbology::Code93,
        BarcodeFormat::CODABAR => Symbology::Codabar,
        BarcodeFormat::ITF => Symbology::Itf,
        BarcodeFormat::RSS_14 => Symbology::DataBar,
        BarcodeFormat::RSS_EXPANDED => Symbology::DataBarExpanded,
        _ => return None,
    };
    Some(symbology)
}

/// Decode every barcode rxing finds in `image`
///
/// Regions are mapped back to the source frame like the QR grids are.
pub fn decode_barcodes(
    image: &GrayImage,
    scale: f32,
    frame_width: u32,
    frame_height: u32,
    filter: SymbologyFilter,
) -> Vec<Barcode> {
    if image.width() == 0 || image.height() == 0 {
        return Vec::new();
    }

    let start = Instant::now();
    let results = match rxing::helpers::detect_multiple_in_luma(
        image.as_raw().clone(),
        image.width(),
        image.height(),
    ) {
        Ok(results) => results,
        Err(e) => {
            // NotFound is the common case on frames without codes
            trace!(error = %e, "No barcodes in frame");
            return Vec::new();
        }
    };
    trace!(
        count = results.len(),
        detection_ms = start.elapsed().as_millis(),
        "Barcode search complete"
    );

    results
        .iter()
        .filter_map(|result| {
            let Some(symbology) = symbology_of(result.getBarcodeFormat()) else {
                debug!(format = ?result.getBarcodeFormat(), "Ignoring unsupported format");
                return None;
            };
            if !filter.allows(symbology) {
                return None;
            }

            let points = result.getPoints();
            let min_x = points.iter().map(|p| p.x.max(0.0)).fold(f32::MAX, f32::min);
            let max_x = points.iter().map(|p| p.x.max(0.0)).fold(0.0, f32::max);
            let min_y = points.iter().map(|p| p.y.max(0.0)).fold(f32::MAX, f32::min);
            let max_y = points.iter().map(|p| p.y.max(0.0)).fold(0.0, f32::max);
            let region = if points.is_empty() {
                FrameRegion::from_pixels(0, 0, frame_width, frame_height, frame_width, frame_height)
            } else {
                FrameRegion::from_pixels(
                    (min_x * scale) as u32,
                    (min_y * scale) as u32,
                    ((max_x - min_x) * scale) as u32,
                    ((max_y - min_y) * scale) as u32,
                    frame_width,
                    frame_height,
                )
            };

            debug!(%symbology, content = %result.getText(), x = region.x, y = region.y, "Detected barcode");
            Some(Barcode {
                display_value: result.getText().to_string(),
                symbology,
                region,
            })
        })
        .collect()
}
