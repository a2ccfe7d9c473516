use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use tracing::debug;

use crate::geom::{shifted, BoundingBox};

/// Polygons with fewer points than this carry no fillable area.
pub const MIN_CONTOUR_POINTS: usize = 3;

/// Stable index of a component within one image's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub usize);

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One connected ink region, represented by its outer boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub id: ComponentId,
    /// Boundary points in pixel coordinates (y=0 is top of image).
    pub points: Vec<Point<i32>>,
    pub bbox: BoundingBox,
}

impl Component {
    /// Build a component from a boundary polygon.
    /// `None` for degenerate polygons (fewer than [`MIN_CONTOUR_POINTS`]).
    pub fn new(id: ComponentId, points: Vec<Point<i32>>) -> Option<Self> {
        if points.len() < MIN_CONTOUR_POINTS {
            return None;
        }
        let bbox = BoundingBox::of_points(&points)?;
        Some(Component { id, points, bbox })
    }
}

/// Number the polygons in list order, dropping degenerate ones.
pub fn into_components(polygons: Vec<Vec<Point<i32>>>) -> Vec<Component> {
    polygons
        .into_iter()
        .filter(|p| p.len() >= MIN_CONTOUR_POINTS)
        .enumerate()
        .filter_map(|(i, p)| Component::new(ComponentId(i), p))
        .collect()
}

/// Traces a binary raster into ink boundary polygons.
///
/// Degenerate polygons (fewer than 3 points) must be dropped. The order of
/// the returned list carries no meaning.
pub trait ComponentExtractor: Send + Sync {
    fn extract(&self, binary: &GrayImage) -> Vec<Vec<Point<i32>>>;
}

/// Outermost borders only; holes and anything nested inside them are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderExtractor;

impl ComponentExtractor for BorderExtractor {
    fn extract(&self, binary: &GrayImage) -> Vec<Vec<Point<i32>>> {
        // The tracer misreports ink touching the image edge, so trace inside
        // a one-pixel background frame and shift back afterwards.
        let mut framed = GrayImage::new(binary.width() + 2, binary.height() + 2);
        imageops::replace(&mut framed, binary, 1, 1);
        let contours = find_contours::<i32>(&framed);
        let total = contours.len();

        let result: Vec<Vec<Point<i32>>> = contours
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter(|c| c.points.len() >= MIN_CONTOUR_POINTS)
            .map(|c| shifted(&c.points, -1, -1))
            .collect();

        debug!(traced = total, kept = result.len(), "contours");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn extracts_one_polygon_per_blob() {
        let mut bw = GrayImage::new(40, 20);
        draw_filled_rect_mut(&mut bw, Rect::at(2, 2).of_size(6, 6), Luma([255]));
        draw_filled_rect_mut(&mut bw, Rect::at(20, 4).of_size(10, 8), Luma([255]));
        let polygons = BorderExtractor.extract(&bw);
        assert_eq!(polygons.len(), 2);
        let mut widths: Vec<u32> = polygons
            .iter()
            .map(|p| BoundingBox::of_points(p).unwrap().width())
            .collect();
        widths.sort();
        assert_eq!(widths, vec![6, 10]);
    }

    #[test]
    fn ink_on_every_edge_is_traced() {
        let mut bw = GrayImage::new(60, 30);
        draw_filled_rect_mut(&mut bw, Rect::at(0, 5).of_size(8, 10), Luma([255]));
        draw_filled_rect_mut(&mut bw, Rect::at(20, 0).of_size(6, 6), Luma([255]));
        draw_filled_rect_mut(&mut bw, Rect::at(20, 24).of_size(6, 6), Luma([255]));
        draw_filled_rect_mut(&mut bw, Rect::at(52, 5).of_size(8, 10), Luma([255]));
        draw_filled_rect_mut(&mut bw, Rect::at(35, 10).of_size(5, 5), Luma([255]));

        let mut boxes: Vec<BoundingBox> = BorderExtractor
            .extract(&bw)
            .iter()
            .map(|p| BoundingBox::of_points(p).unwrap())
            .collect();
        boxes.sort_by_key(|b| (b.min_x, b.min_y));
        let corners: Vec<(i32, i32, i32, i32)> = boxes
            .iter()
            .map(|b| (b.min_x, b.min_y, b.max_x, b.max_y))
            .collect();
        assert_eq!(
            corners,
            vec![
                (0, 5, 7, 14),
                (20, 0, 25, 5),
                (20, 24, 25, 29),
                (35, 10, 39, 14),
                (52, 5, 59, 14),
            ]
        );
    }

    #[test]
    fn ink_filling_the_whole_image_is_one_component() {
        let bw = GrayImage::from_pixel(12, 7, Luma([255]));
        let polygons = BorderExtractor.extract(&bw);
        assert_eq!(polygons.len(), 1);
        let b = BoundingBox::of_points(&polygons[0]).unwrap();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (0, 0, 11, 6));
    }

    #[test]
    fn holes_and_nested_blobs_are_not_components() {
        // A ring with a dot inside its hole.
        let mut bw = GrayImage::new(30, 30);
        draw_filled_rect_mut(&mut bw, Rect::at(2, 2).of_size(20, 20), Luma([255]));
        draw_filled_rect_mut(&mut bw, Rect::at(6, 6).of_size(12, 12), Luma([0]));
        draw_filled_rect_mut(&mut bw, Rect::at(10, 10).of_size(4, 4), Luma([255]));
        let polygons = BorderExtractor.extract(&bw);
        assert_eq!(polygons.len(), 1);
        assert_eq!(BoundingBox::of_points(&polygons[0]).unwrap().width(), 20);
    }

    #[test]
    fn single_pixels_are_dropped() {
        let mut bw = GrayImage::new(10, 10);
        bw.put_pixel(5, 5, Luma([255]));
        assert!(BorderExtractor.extract(&bw).is_empty());
    }

    #[test]
    fn degenerate_polygons_do_not_consume_ids() {
        let polygons = vec![
            vec![Point::new(0, 0), Point::new(1, 0)],
            vec![Point::new(0, 0), Point::new(3, 0), Point::new(3, 3)],
            vec![Point::new(5, 5), Point::new(8, 5), Point::new(8, 9), Point::new(5, 9)],
        ];
        let components = into_components(polygons);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].id, ComponentId(0));
        assert_eq!(components[1].id, ComponentId(1));
        assert_eq!(components[1].bbox.min_x, 5);
    }
}
