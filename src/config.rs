use image::Rgb;

use crate::error::SegmentError;

/// All segmentation parameters in one struct.
/// Adjust with struct update syntax over `SegmentConfig::default()`.
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    // -- Bitmap stage --
    /// Threshold method for converting to binary.
    pub threshold: ThresholdMethod,
    /// If true, the input is light ink on a dark background.
    pub invert: bool,
    /// Median filter radius applied before thresholding. 0 = off.
    pub denoise_radius: u32,

    // -- Diacritic stage --
    /// Area ratio below which a component counts as a diacritic
    /// candidate. Must lie in (0, 1].
    pub diacritic_threshold: f64,

    // -- Debug overlay --
    /// Maximum overlay height after scaling.
    pub overlay_max_height: u32,
    /// Maximum overlay width after scaling.
    pub overlay_max_width: u32,
    /// Colors used to tell neighbouring subwords apart.
    pub palette: Vec<Rgb<u8>>,
}

/// Threshold method for converting a grayscale image to binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMethod {
    /// Fixed brightness threshold (0-255). Pixels at or below it are ink.
    Fixed(u8),
    /// Otsu's method (automatic).
    Otsu,
}

/// Default overlay palette.
pub const DEFAULT_PALETTE: [Rgb<u8>; 10] = [
    Rgb([0, 0, 255]),
    Rgb([0, 255, 0]),
    Rgb([255, 0, 0]),
    Rgb([255, 0, 255]),
    Rgb([255, 255, 0]),
    Rgb([125, 0, 125]),
    Rgb([0, 125, 125]),
    Rgb([0, 0, 125]),
    Rgb([0, 125, 0]),
    Rgb([125, 0, 0]),
];

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdMethod::Otsu,
            invert: false,
            denoise_radius: 1,
            diacritic_threshold: 0.2,
            overlay_max_height: 300,
            overlay_max_width: 1500,
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl SegmentConfig {
    /// Reject parameter combinations the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), SegmentError> {
        let t = self.diacritic_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(SegmentError::InvalidConfig(format!(
                "diacritic_threshold must lie in (0, 1], got {}",
                t
            )));
        }
        if self.palette.is_empty() {
            return Err(SegmentError::InvalidConfig("palette is empty".into()));
        }
        if self.overlay_max_height == 0 || self.overlay_max_width == 0 {
            return Err(SegmentError::InvalidConfig(format!(
                "overlay bound must be non-zero, got {}x{}",
                self.overlay_max_width, self.overlay_max_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SegmentConfig::default().validate().is_ok());
    }

    #[test]
    fn threshold_outside_unit_interval_is_rejected() {
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            let config = SegmentConfig {
                diacritic_threshold: bad,
                ..SegmentConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(SegmentError::InvalidConfig(_))),
                "threshold {} should be rejected",
                bad
            );
        }
        let config = SegmentConfig {
            diacritic_threshold: 1.0,
            ..SegmentConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_palette_is_rejected() {
        let config = SegmentConfig {
            palette: vec![],
            ..SegmentConfig::default()
        };
        assert!(matches!(config.validate(), Err(SegmentError::InvalidConfig(_))));
    }
}
