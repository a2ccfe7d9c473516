//! Binarization: color or gray raster → ink mask.

use image::{DynamicImage, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::median_filter;
use tracing::debug;

use crate::config::{SegmentConfig, ThresholdMethod};

/// Ink pixel value in a binary raster. Background is 0.
pub const INK: u8 = 255;

/// Turns a source image into a binary raster with ink = [`INK`], background = 0.
///
/// Must be deterministic for identical input.
pub trait Binarizer: Send + Sync {
    fn binarize(&self, image: &DynamicImage) -> GrayImage;
}

/// Median denoise followed by a global threshold.
#[derive(Debug, Clone)]
pub struct ThresholdBinarizer {
    pub method: ThresholdMethod,
    pub invert: bool,
    pub denoise_radius: u32,
}

impl ThresholdBinarizer {
    pub fn from_config(config: &SegmentConfig) -> Self {
        Self {
            method: config.threshold,
            invert: config.invert,
            denoise_radius: config.denoise_radius,
        }
    }
}

impl Default for ThresholdBinarizer {
    fn default() -> Self {
        Self::from_config(&SegmentConfig::default())
    }
}

impl Binarizer for ThresholdBinarizer {
    fn binarize(&self, image: &DynamicImage) -> GrayImage {
        let mut gray = image.to_luma8();
        if self.invert {
            image::imageops::invert(&mut gray);
        }
        if self.denoise_radius > 0 {
            gray = median_filter(&gray, self.denoise_radius, self.denoise_radius);
        }

        // A flat image has no ink, whatever Otsu would pick for it.
        let (lo, hi) = gray
            .pixels()
            .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
        if lo >= hi {
            debug!("uniform image ({}x{}), no ink", gray.width(), gray.height());
            return GrayImage::new(gray.width(), gray.height());
        }

        let level = match self.method {
            ThresholdMethod::Fixed(t) => t,
            ThresholdMethod::Otsu => otsu_level(&gray),
        };
        debug!(level, "threshold");

        threshold(&gray, level, ThresholdType::BinaryInverted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn page_with_block() -> DynamicImage {
        let mut img = GrayImage::from_pixel(40, 20, Luma([255]));
        draw_filled_rect_mut(&mut img, Rect::at(10, 5).of_size(8, 6), Luma([0]));
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn dark_ink_becomes_foreground() {
        let binarizer = ThresholdBinarizer {
            denoise_radius: 0,
            ..ThresholdBinarizer::default()
        };
        let bw = binarizer.binarize(&page_with_block());
        assert_eq!(bw.get_pixel(12, 7).0[0], INK);
        assert_eq!(bw.get_pixel(0, 0).0[0], 0);
        assert_eq!(bw.get_pixel(30, 15).0[0], 0);
    }

    #[test]
    fn invert_swaps_foreground() {
        let binarizer = ThresholdBinarizer {
            invert: true,
            denoise_radius: 0,
            ..ThresholdBinarizer::default()
        };
        let bw = binarizer.binarize(&page_with_block());
        assert_eq!(bw.get_pixel(12, 7).0[0], 0);
        assert_eq!(bw.get_pixel(0, 0).0[0], INK);
    }

    #[test]
    fn blank_page_has_no_ink() {
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([255])));
        let bw = ThresholdBinarizer::default().binarize(&blank);
        assert!(bw.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn median_filter_removes_speckle() {
        let mut img = GrayImage::from_pixel(20, 20, Luma([255]));
        img.put_pixel(3, 3, Luma([0]));
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(6, 6), Luma([0]));
        let bw = ThresholdBinarizer {
            method: ThresholdMethod::Fixed(128),
            invert: false,
            denoise_radius: 1,
        }
        .binarize(&DynamicImage::ImageLuma8(img));
        assert_eq!(bw.get_pixel(3, 3).0[0], 0);
        assert_eq!(bw.get_pixel(12, 12).0[0], INK);
    }
}
