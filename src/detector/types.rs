// SPDX-License-Identifier: MPL-2.0

//! Detection result types

use serde::Serialize;

/// Barcode formats the detector can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    QrCode,
    DataMatrix,
    Aztec,
    Pdf417,
    MaxiCode,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Code128,
    Code39,
    Code93,
    Codabar,
    Itf,
    DataBar,
    DataBarExpanded,
}

impl Symbology {
    /// Every symbology the decoders implement
    pub const SUPPORTED: &'static [Symbology] = &[
        Symbology::QrCode,
        Symbology::DataMatrix,
        Symbology::Aztec,
        Symbology::Pdf417,
        Symbology::MaxiCode,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Code93,
        Symbology::Codabar,
        Symbology::Itf,
        Symbology::DataBar,
        Symbology::DataBarExpanded,
    ];

    /// One-dimensional (linear) barcode
    pub fn is_linear(&self) -> bool {
        matches!(
            self,
            Symbology::Ean13
                | Symbology::Ean8
                | Symbology::UpcA
                | Symbology::UpcE
                | Symbology::Code128
                | Symbology::Code39
                | Symbology::Code93
                | Symbology::Codabar
                | Symbology::Itf
                | Symbology::DataBar
                | Symbology::DataBarExpanded
        )
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Symbology::QrCode => "QR Code",
            Symbology::DataMatrix => "Data Matrix",
            Symbology::Aztec => "Aztec",
            Symbology::Pdf417 => "PDF417",
            Symbology::MaxiCode => "MaxiCode",
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcA => "UPC-A",
            Symbology::UpcE => "UPC-E",
            Symbology::Code128 => "Code 128",
            Symbology::Code39 => "Code 39",
            Symbology::Code93 => "Code 93",
            Symbology::Codabar => "Codabar",
            Symbology::Itf => "ITF",
            Symbology::DataBar => "DataBar",
            Symbology::DataBarExpanded => "DataBar Expanded",
        };
        f.write_str(name)
    }
}

/// Which symbologies a detector reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbologyFilter {
    /// Every supported symbology
    All,
    /// Only the listed ones
    Only(&'static [Symbology]),
}

impl SymbologyFilter {
    pub fn allows(&self, symbology: Symbology) -> bool {
        match self {
            SymbologyFilter::All => true,
            SymbologyFilter::Only(list) => list.contains(&symbology),
        }
    }
}

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        let fw = frame_width.max(1) as f32;
        let fh = frame_height.max(1) as f32;
        Self {
            x: x as f32 / fw,
            y: y as f32 / fh,
            width: width as f32 / fw,
            height: height as f32 / fh,
        }
    }
}

/// A decoded barcode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Barcode {
    /// Human readable payload
    pub display_value: String,
    pub symbology: Symbology,
    /// Where the code was found
    pub region: FrameRegion,
}

impl Barcode {
    /// The payload when it is a web link
    pub fn link(&self) -> Option<&str> {
        link_of(&self.display_value)
    }
}

/// `text` when it is an http(s) URL
pub fn link_of(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://")).then_some(trimmed)
}

/// Barcodes found in one analyzed frame
///
/// `generation` identifies the camera session the frame came from, so
/// results that arrive after the session was restarted can be told apart.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionBatch {
    pub generation: u64,
    pub barcodes: Vec<Barcode>,
}

impl DetectionBatch {
    pub fn new(generation: u64, barcodes: Vec<Barcode>) -> Self {
        Self {
            generation,
            barcodes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_region_from_pixels() {
        let region = FrameRegion::from_pixels(160, 120, 320, 240, 640, 480);
        assert_eq!(region.x, 0.25);
        assert_eq!(region.y, 0.25);
        assert_eq!(region.width, 0.5);
        assert_eq!(region.height, 0.5);
    }

    #[test]
    fn test_filter() {
        assert!(SymbologyFilter::All.allows(Symbology::QrCode));
        assert!(SymbologyFilter::Only(Symbology::SUPPORTED).allows(Symbology::QrCode));
        assert!(!SymbologyFilter::Only(&[]).allows(Symbology::QrCode));
        assert!(SymbologyFilter::Only(&[Symbology::Ean13]).allows(Symbology::Ean13));
        assert!(!SymbologyFilter::Only(&[Symbology::Ean13]).allows(Symbology::QrCode));
    }

    #[test]
    fn test_linear_symbologies() {
        assert!(Symbology::Ean13.is_linear());
        assert!(Symbology::Code128.is_linear());
        assert!(!Symbology::QrCode.is_linear());
        assert!(!Symbology::DataMatrix.is_linear());
        assert_eq!(Symbology::Ean13.to_string(), "EAN-13");
    }

    #[test]
    fn test_link_detection() {
        assert_eq!(link_of("https://example.com"), Some("https://example.com"));
        assert_eq!(link_of(" HTTP://example.com/a "), Some("HTTP://example.com/a"));
        assert_eq!(link_of("ABC123"), None);
        assert_eq!(link_of("WIFI:S:home;;"), None);
    }
}
