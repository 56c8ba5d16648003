// SPDX-License-Identifier: GPL-3.0-only

//! Luma extraction for the decoders
//!
//! Frames are reduced to a luma plane and downscaled so neither side exceeds
//! the detector's maximum dimension.

use crate::backends::camera::CameraFrame;
use image::GrayImage;

/// Luma plane of `frame`, downscaled with bilinear sampling when larger
/// than `max_dimension`
///
/// Returns the image and the factor mapping its coordinates back to the frame.
pub fn luma_plane(frame: &CameraFrame, max_dimension: u32) -> (GrayImage, f32) {
    let (width, height) = (frame.width, frame.height);
    if width == 0 || height == 0 {
        return (GrayImage::new(0, 0), 1.0);
    }

    if width <= max_dimension && height <= max_dimension {
        let image = GrayImage::from_fn(width, height, |x, y| image::Luma([frame.luma(x, y)]));
        return (image, 1.0);
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let dst_width = ((width as f32 / scale) as u32).max(1);
    let dst_height = ((height as f32 / scale) as u32).max(1);
    (downscale_luma(frame, dst_width, dst_height), scale)
}

/// Bilinear downscale straight to luma
fn downscale_luma(frame: &CameraFrame, dst_width: u32, dst_height: u32) -> GrayImage {
    let src_width = frame.width;
    let src_height = frame.height;
    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    GrayImage::from_fn(dst_width, dst_height, |x, y| {
        let src_x = x as f32 * x_ratio;
        let src_y = y as f32 * y_ratio;

        let x0 = src_x as u32;
        let y0 = src_y as u32;
        let x1 = (x0 + 1).min(src_width - 1);
        let y1 = (y0 + 1).min(src_height - 1);
        let x_frac = src_x - x0 as f32;
        let y_frac = src_y - y0 as f32;

        let p00 = frame.luma(x0, y0) as f32;
        let p01 = frame.luma(x1, y0) as f32;
        let p10 = frame.luma(x0, y1) as f32;
        let p11 = frame.luma(x1, y1) as f32;

        let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
            + p01 * x_frac * (1.0 - y_frac)
            + p10 * (1.0 - x_frac) * y_frac
            + p11 * x_frac * y_frac;
        image::Luma([value as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_frame_is_not_scaled() {
        let frame = CameraFrame::from_rgba(2, 1, vec![255, 255, 255, 255, 0, 0, 0, 255]);
        let (image, scale) = luma_plane(&frame, 640);
        assert_eq!(scale, 1.0);
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0)[0], 255);
        assert_eq!(image.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_downscale_keeps_gradient() {
        // 4x2 gray gradient
        let row: Vec<u8> = [0u8, 85, 170, 255]
            .iter()
            .flat_map(|&v| [v, v, v, 255])
            .collect();
        let data = [row.clone(), row].concat();
        let frame = CameraFrame::from_rgba(4, 2, data);

        let (image, scale) = luma_plane(&frame, 2);
        assert_eq!(scale, 2.0);
        assert_eq!(image.dimensions(), (2, 1));
        assert!(image.get_pixel(0, 0)[0] < 100);
        assert!(image.get_pixel(1, 0)[0] > 150);
    }

    #[test]
    fn test_empty_frame() {
        let frame = CameraFrame::from_rgba(0, 0, Vec::new());
        let (image, scale) = luma_plane(&frame, 640);
        assert_eq!(image.dimensions(), (0, 0));
        assert_eq!(scale, 1.0);
    }
}
