//! Primary/secondary classification and diacritic binding.
//!
//! Both stages sit behind traits so the pipeline can run with any
//! classifier or binder that honours the same contracts. The defaults here
//! are geometric heuristics over component areas and bounding boxes.

use std::collections::BTreeMap;

use image::GrayImage;
use tracing::debug;

use crate::bitmap::INK;
use crate::contour::{Component, ComponentId};
use crate::error::SegmentError;
use crate::labels::LabelMap;

/// Labels each component as primary stroke (`true`) or diacritic (`false`).
///
/// Must return exactly one flag per component, in component order.
pub trait DiacriticClassifier: Send + Sync {
    fn classify(
        &self,
        binary: &GrayImage,
        components: &[Component],
        labels: &LabelMap,
        threshold: f64,
    ) -> Vec<bool>;
}

/// Maps every secondary component to the primary component it belongs to.
///
/// Must be total over the secondary set, and every value must be a primary.
pub trait DiacriticBinder: Send + Sync {
    fn bind(
        &self,
        labels: &LabelMap,
        components: &[Component],
        is_primary: &[bool],
    ) -> Result<SecondaryToPrimary, SegmentError>;
}

/// Secondary id → owning primary id, iterated in ascending secondary id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecondaryToPrimary(BTreeMap<ComponentId, ComponentId>);

impl SecondaryToPrimary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, secondary: ComponentId, primary: ComponentId) {
        self.0.insert(secondary, primary);
    }

    pub fn get(&self, secondary: ComponentId) -> Option<ComponentId> {
        self.0.get(&secondary).copied()
    }

    pub fn contains(&self, secondary: ComponentId) -> bool {
        self.0.contains_key(&secondary)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, ComponentId)> + '_ {
        self.0.iter().map(|(s, p)| (*s, *p))
    }
}

impl FromIterator<(ComponentId, ComponentId)> for SecondaryToPrimary {
    fn from_iter<I: IntoIterator<Item = (ComponentId, ComponentId)>>(iter: I) -> Self {
        SecondaryToPrimary(iter.into_iter().collect())
    }
}

/// Ink pixels owned by each component.
pub fn ink_areas(binary: &GrayImage, components: &[Component], labels: &LabelMap) -> Vec<usize> {
    let mut areas = vec![0usize; components.len()];
    for (x, y, id) in labels.owned_pixels() {
        let inked = binary.get_pixel_checked(x, y).is_some_and(|p| p.0[0] == INK);
        if inked {
            if let Some(area) = areas.get_mut(id.0) {
                *area += 1;
            }
        }
    }
    areas
}

/// Small components sharing columns with a large one are diacritics.
///
/// A component is small when its ink area is below `threshold` times the
/// largest ink area. Small components with no large component above or below
/// them (isolated marks) stay primary and form their own subword. The largest
/// component is always primary.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaRatioClassifier;

impl DiacriticClassifier for AreaRatioClassifier {
    fn classify(
        &self,
        binary: &GrayImage,
        components: &[Component],
        labels: &LabelMap,
        threshold: f64,
    ) -> Vec<bool> {
        let areas = ink_areas(binary, components, labels);
        let largest = areas.iter().copied().max().unwrap_or(0) as f64;
        let small: Vec<bool> = areas
            .iter()
            .map(|&a| (a as f64) < threshold * largest)
            .collect();

        components
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if !small[i] {
                    return true;
                }
                let over_stroke = components
                    .iter()
                    .enumerate()
                    .any(|(j, other)| !small[j] && c.bbox.x_overlap(&other.bbox) > 0);
                !over_stroke
            })
            .collect()
    }
}

/// Binds each diacritic to the vertically nearest primary sharing its columns.
///
/// Ties go to the larger column overlap, then the lower id. A diacritic with
/// no column overlap binds to the primary with the nearest horizontal center.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestPrimaryBinder;

impl DiacriticBinder for NearestPrimaryBinder {
    fn bind(
        &self,
        _labels: &LabelMap,
        components: &[Component],
        is_primary: &[bool],
    ) -> Result<SecondaryToPrimary, SegmentError> {
        if is_primary.len() != components.len() {
            return Err(SegmentError::invariant(format!(
                "{} classification flags for {} components",
                is_primary.len(),
                components.len()
            )));
        }
        let primaries: Vec<&Component> = components
            .iter()
            .zip(is_primary)
            .filter(|(_, p)| **p)
            .map(|(c, _)| c)
            .collect();

        let mut binding = SecondaryToPrimary::new();
        for secondary in components.iter().zip(is_primary).filter(|(_, p)| !**p).map(|(c, _)| c) {
            let stacked = primaries
                .iter()
                .filter(|p| p.bbox.x_overlap(&secondary.bbox) > 0)
                .min_by_key(|p| {
                    (
                        p.bbox.y_gap(&secondary.bbox),
                        -p.bbox.x_overlap(&secondary.bbox),
                        p.id,
                    )
                });
            let owner = match stacked {
                Some(p) => p,
                None => {
                    let cx = secondary.bbox.center_x();
                    primaries
                        .iter()
                        .min_by(|a, b| {
                            let da = (a.bbox.center_x() - cx).abs();
                            let db = (b.bbox.center_x() - cx).abs();
                            da.total_cmp(&db).then(a.id.cmp(&b.id))
                        })
                        .ok_or_else(|| {
                            SegmentError::invariant(format!(
                                "secondary component {} has no primary to bind to",
                                secondary.id
                            ))
                        })?
                }
            };
            binding.insert(secondary.id, owner.id);
        }

        debug!(bound = binding.len(), primaries = primaries.len(), "bind diacritics");
        Ok(binding)
    }
}
