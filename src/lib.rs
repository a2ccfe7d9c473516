//! subword_seg: word image → ordered subwords with their diacritics.
//!
//! Splits a raster of connected script into subwords (the runs of ink
//! between pen lifts), binds each diacritic mark to its base stroke and
//! returns the subwords in right-to-left reading order.
//!
//! # Example
//!
//! ```no_run
//! use subword_seg::{render, Segmenter, SegmentConfig};
//!
//! let image = image::open("word.png").unwrap();
//! let segmenter = Segmenter::new(SegmentConfig::default())?;
//! let subwords = segmenter.segment(&image, false)?;
//! let stacked = render::render_vertical_composite(&subwords)?;
//! # Ok::<(), subword_seg::SegmentError>(())
//! ```

#![forbid(unsafe_code)]

mod geom;

pub mod assemble;
pub mod bitmap;
pub mod config;
pub mod contour;
pub mod diacritics;
pub mod error;
pub mod labels;
pub mod order;
pub mod render;

pub use assemble::SubwordGroup;
pub use bitmap::{Binarizer, ThresholdBinarizer};
pub use config::{SegmentConfig, ThresholdMethod};
pub use contour::{BorderExtractor, Component, ComponentExtractor, ComponentId};
pub use diacritics::{
    AreaRatioClassifier, DiacriticBinder, DiacriticClassifier, NearestPrimaryBinder,
    SecondaryToPrimary,
};
pub use error::SegmentError;
pub use geom::BoundingBox;
pub use labels::LabelMap;
pub use order::{MassCenterProvider, OrderedSubwords, PolygonCentroid};

use std::time::Instant;

use image::{DynamicImage, GrayImage, RgbImage};
use rand::Rng;
use tracing::{debug, info};

/// The segmentation pipeline with its pluggable collaborators.
///
/// Holds no per-image state: one `Segmenter` can process any number of
/// images, from any number of threads.
pub struct Segmenter {
    config: SegmentConfig,
    binarizer: Box<dyn Binarizer>,
    extractor: Box<dyn ComponentExtractor>,
    classifier: Box<dyn DiacriticClassifier>,
    binder: Box<dyn DiacriticBinder>,
    mass_centers: Box<dyn MassCenterProvider>,
}

impl Segmenter {
    /// Pipeline with the default collaborators configured from `config`.
    pub fn new(config: SegmentConfig) -> Result<Self, SegmentError> {
        config.validate()?;
        Ok(Segmenter {
            binarizer: Box::new(ThresholdBinarizer::from_config(&config)),
            extractor: Box::new(BorderExtractor),
            classifier: Box::new(AreaRatioClassifier),
            binder: Box::new(NearestPrimaryBinder),
            mass_centers: Box::new(PolygonCentroid),
            config,
        })
    }

    pub fn with_binarizer(mut self, binarizer: impl Binarizer + 'static) -> Self {
        self.binarizer = Box::new(binarizer);
        self
    }

    pub fn with_extractor(mut self, extractor: impl ComponentExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_classifier(mut self, classifier: impl DiacriticClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_binder(mut self, binder: impl DiacriticBinder + 'static) -> Self {
        self.binder = Box::new(binder);
        self
    }

    pub fn with_mass_centers(mut self, provider: impl MassCenterProvider + 'static) -> Self {
        self.mass_centers = Box::new(provider);
        self
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Full pipeline: source image → subwords in reading order.
    ///
    /// With `delete_diacritics` the binder is skipped and diacritic
    /// components are left out of every subword.
    pub fn segment(
        &self,
        image: &DynamicImage,
        delete_diacritics: bool,
    ) -> Result<OrderedSubwords, SegmentError> {
        let binary = self.binarizer.binarize(image);
        self.segment_binary(&binary, delete_diacritics)
    }

    /// Pipeline from an already binarized raster (ink = 255).
    pub fn segment_binary(
        &self,
        binary: &GrayImage,
        delete_diacritics: bool,
    ) -> Result<OrderedSubwords, SegmentError> {
        let t_start = Instant::now();
        let (w, h) = binary.dimensions();

        // ── Components ────────────────────────────────────
        let components = contour::into_components(self.extractor.extract(binary));
        if components.is_empty() {
            info!(width = w, height = h, "no ink components");
            return Ok(OrderedSubwords::empty());
        }
        let labels = LabelMap::build(w, h, &components);
        debug!(components = components.len(), "label map {}x{}", w, h);

        // ── Classify ──────────────────────────────────────
        let is_primary = self.classifier.classify(
            binary,
            &components,
            &labels,
            self.config.diacritic_threshold,
        );
        if is_primary.len() != components.len() {
            return Err(SegmentError::invariant(format!(
                "classifier returned {} flags for {} components",
                is_primary.len(),
                components.len()
            )));
        }
        let n_primary = is_primary.iter().filter(|p| **p).count();
        debug!(primary = n_primary, secondary = components.len() - n_primary, "classify");

        // ── Bind & assemble ───────────────────────────────
        let binding = if delete_diacritics {
            None
        } else {
            Some(self.binder.bind(&labels, &components, &is_primary)?)
        };
        let groups = assemble::assemble(&is_primary, binding.as_ref())?;

        // ── Order ─────────────────────────────────────────
        let n_components = components.len();
        let subwords = order::order(components, groups, self.mass_centers.as_ref())?;

        info!(
            components = n_components,
            subwords = subwords.len(),
            delete_diacritics,
            elapsed_ms = t_start.elapsed().as_millis() as u64,
            "segmented {}x{} image",
            w,
            h
        );
        Ok(subwords)
    }

    /// Colored overlay of `subwords` on this pipeline's binarization of `image`.
    pub fn render_debug_overlay<R: Rng + ?Sized>(
        &self,
        image: &DynamicImage,
        subwords: &OrderedSubwords,
        rng: &mut R,
    ) -> Result<RgbImage, SegmentError> {
        render::render_debug_overlay(image, subwords, self.binarizer.as_ref(), &self.config, rng)
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Segmenter {
            config: SegmentConfig::default(),
            binarizer: Box::new(ThresholdBinarizer::default()),
            extractor: Box::new(BorderExtractor),
            classifier: Box::new(AreaRatioClassifier),
            binder: Box::new(NearestPrimaryBinder),
            mass_centers: Box::new(PolygonCentroid),
        }
    }
}

/// Segment `image` with the default pipeline.
pub fn segment(image: &DynamicImage, delete_diacritics: bool) -> Result<OrderedSubwords, SegmentError> {
    Segmenter::default().segment(image, delete_diacritics)
}
