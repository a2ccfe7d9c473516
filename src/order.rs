//! Reading-order sort of subword groups.

use geo::{Centroid, LineString, Polygon};
use imageproc::point::Point;
use tracing::debug;

use crate::assemble::SubwordGroup;
use crate::contour::{Component, ComponentId};
use crate::error::SegmentError;
use crate::geom::BoundingBox;

/// Returns one representative coordinate per polygon, order preserved.
pub trait MassCenterProvider: Send + Sync {
    fn mass_centers(&self, polygons: &[&[Point<i32>]]) -> Vec<(f64, f64)>;
}

/// Area centroid of the boundary polygon.
///
/// Zero-area polygons fall back to the centroid of their outline. An empty
/// polygon has no centroid and yields NaN.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonCentroid;

impl MassCenterProvider for PolygonCentroid {
    fn mass_centers(&self, polygons: &[&[Point<i32>]]) -> Vec<(f64, f64)> {
        polygons
            .iter()
            .map(|points| {
                let ring: LineString<f64> = points
                    .iter()
                    .map(|p| (p.x as f64, p.y as f64))
                    .collect::<Vec<_>>()
                    .into();
                Polygon::new(ring, vec![])
                    .centroid()
                    .map(|c| (c.x(), c.y()))
                    .unwrap_or((f64::NAN, f64::NAN))
            })
            .collect()
    }
}

/// Subword groups in reading order, with the component arena they index.
#[derive(Debug, Clone, Default)]
pub struct OrderedSubwords {
    components: Vec<Component>,
    groups: Vec<SubwordGroup>,
}

impl OrderedSubwords {
    /// Result for an image with no ink.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubwordGroup> {
        self.groups.iter()
    }

    /// Every component of the image, including suppressed diacritics.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    /// Components of group `index`, primary first.
    pub fn group_components(&self, index: usize) -> Vec<&Component> {
        self.groups
            .get(index)
            .map(|g| g.ids().filter_map(|id| self.component(id)).collect())
            .unwrap_or_default()
    }

    /// Tight box around every component of group `index`.
    pub fn group_bbox(&self, index: usize) -> Option<BoundingBox> {
        self.group_components(index)
            .iter()
            .map(|c| c.bbox)
            .reduce(|a, b| a.union(&b))
    }
}

impl<'a> IntoIterator for &'a OrderedSubwords {
    type Item = &'a SubwordGroup;
    type IntoIter = std::slice::Iter<'a, SubwordGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Sort groups right-to-left by the mass center of their primary component.
///
/// The provider is called once with every primary polygon. Groups with equal
/// x keep their assembly order.
pub fn order(
    components: Vec<Component>,
    groups: Vec<SubwordGroup>,
    provider: &dyn MassCenterProvider,
) -> Result<OrderedSubwords, SegmentError> {
    let polygons = groups
        .iter()
        .map(|g| {
            components
                .get(g.primary.0)
                .map(|c| c.points.as_slice())
                .ok_or_else(|| {
                    SegmentError::invariant(format!("group primary {} is not a component", g.primary))
                })
        })
        .collect::<Result<Vec<&[Point<i32>]>, _>>()?;

    let centers = provider.mass_centers(&polygons);
    if centers.len() != groups.len() {
        return Err(SegmentError::invariant(format!(
            "{} mass centers for {} subwords",
            centers.len(),
            groups.len()
        )));
    }
    if let Some((g, _)) = groups.iter().zip(&centers).find(|(_, c)| !c.0.is_finite()) {
        return Err(SegmentError::invariant(format!(
            "no mass center for primary component {}",
            g.primary
        )));
    }

    let mut keyed: Vec<(f64, SubwordGroup)> = centers.iter().map(|c| c.0).zip(groups).collect();
    keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    debug!(subwords = keyed.len(), "order");

    Ok(OrderedSubwords {
        components,
        groups: keyed.into_iter().map(|(_, g)| g).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::into_components;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    /// Provider returning fixed x positions, one per call slot.
    struct FixedX(Vec<f64>);

    impl MassCenterProvider for FixedX {
        fn mass_centers(&self, polygons: &[&[Point<i32>]]) -> Vec<(f64, f64)> {
            self.0.iter().take(polygons.len()).map(|&x| (x, 0.0)).collect()
        }
    }

    fn singletons(n: usize) -> Vec<SubwordGroup> {
        (0..n).map(|i| SubwordGroup::singleton(ComponentId(i))).collect()
    }

    #[test]
    fn centroid_of_rectangle() {
        let r = rect(10, 20, 30, 24);
        let centers = PolygonCentroid.mass_centers(&[&r]);
        assert_eq!(centers.len(), 1);
        assert!((centers[0].0 - 20.0).abs() < 1e-9);
        assert!((centers[0].1 - 22.0).abs() < 1e-9);
    }

    #[test]
    fn flat_polygon_still_has_a_center() {
        let line = vec![Point::new(0, 5), Point::new(10, 5), Point::new(4, 5)];
        let centers = PolygonCentroid.mass_centers(&[&line]);
        assert!(centers[0].0.is_finite());
    }

    #[test]
    fn rightmost_subword_comes_first() {
        let components = into_components(vec![
            rect(10, 0, 14, 10),
            rect(90, 0, 94, 10),
            rect(50, 0, 54, 10),
        ]);
        let ordered = order(components, singletons(3), &PolygonCentroid).unwrap();
        let primaries: Vec<usize> = ordered.iter().map(|g| g.primary.0).collect();
        assert_eq!(primaries, vec![1, 2, 0]);
    }

    #[test]
    fn ties_keep_assembly_order() {
        let components = into_components(vec![
            rect(0, 0, 4, 4),
            rect(0, 10, 4, 14),
            rect(0, 20, 4, 24),
            rect(0, 30, 4, 34),
        ]);
        let provider = FixedX(vec![5.0, 9.0, 5.0, 9.0]);
        let ordered = order(components, singletons(4), &provider).unwrap();
        let primaries: Vec<usize> = ordered.iter().map(|g| g.primary.0).collect();
        assert_eq!(primaries, vec![1, 3, 0, 2]);
    }

    #[test]
    fn short_provider_output_is_rejected() {
        let components = into_components(vec![rect(0, 0, 4, 4), rect(10, 0, 14, 4)]);
        let err = order(components, singletons(2), &FixedX(vec![1.0])).unwrap_err();
        assert!(matches!(err, SegmentError::InvariantViolation(_)));
    }

    #[test]
    fn group_bbox_spans_diacritics() {
        let components = into_components(vec![rect(10, 20, 40, 30), rect(20, 5, 23, 8)]);
        let groups = vec![SubwordGroup {
            primary: ComponentId(0),
            secondaries: vec![ComponentId(1)],
        }];
        let ordered = order(components, groups, &PolygonCentroid).unwrap();
        let bbox = ordered.group_bbox(0).unwrap();
        assert_eq!((bbox.min_y, bbox.max_y, bbox.width()), (5, 30, 31));
        assert_eq!(ordered.group_components(0).len(), 2);
        assert!(ordered.group_bbox(1).is_none());
    }

    #[test]
    fn empty_groups_order_to_empty() {
        let ordered = order(vec![], vec![], &PolygonCentroid).unwrap();
        assert!(ordered.is_empty());
    }
}
