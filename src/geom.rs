//! Shared geometry utilities.

use image::{ImageBuffer, Pixel};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::point::Point;

/// Inclusive axis-aligned pixel box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundingBox {
    /// Tight box around `points`. `None` when `points` is empty.
    pub fn of_points(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let init = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points.iter().fold(init, |b, p| BoundingBox {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Width in pixels, both edges included.
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x + 1).max(0) as u32
    }

    /// Height in pixels, both edges included.
    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y + 1).max(0) as u32
    }

    /// Number of shared columns with `other` (0 when disjoint).
    pub fn x_overlap(&self, other: &BoundingBox) -> i32 {
        (self.max_x.min(other.max_x) - self.min_x.max(other.min_x) + 1).max(0)
    }

    /// Empty rows between the two boxes (0 when they touch, overlap or nest).
    pub fn y_gap(&self, other: &BoundingBox) -> i32 {
        (self.min_y.max(other.min_y) - self.max_y.min(other.max_y) - 1).max(0)
    }

    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) as f64 / 2.0
    }
}

/// Fill a closed polygon, boundary pixels included, clipped to the canvas.
///
/// Interior rows use an even-odd scanline through pixel centers with a
/// half-open vertex rule, so every row sees an even number of crossings.
/// The boundary itself is then stroked, which also covers horizontal edges
/// and one-pixel-wide spurs the scanline misses.
pub fn fill_polygon<P>(canvas: &mut ImageBuffer<P, Vec<P::Subpixel>>, points: &[Point<i32>], color: P)
where
    P: Pixel + 'static,
{
    let mut end = points.len();
    while end > 1 && points[end - 1] == points[0] {
        end -= 1;
    }
    let poly = &points[..end];
    let (width, height) = canvas.dimensions();
    if poly.is_empty() || width == 0 || height == 0 {
        return;
    }

    let y_lo = poly.iter().map(|p| p.y).min().unwrap_or(0).max(0);
    let y_hi = poly
        .iter()
        .map(|p| p.y)
        .max()
        .unwrap_or(-1)
        .min(height as i32 - 1);

    // Crossings are exact fractions (num / den, den > 0) so that filling is
    // invariant under integer translation.
    let mut crossings: Vec<(i64, i64)> = Vec::new();
    for y in y_lo..=y_hi {
        crossings.clear();
        for i in 0..poly.len() {
            let p0 = poly[i];
            let p1 = poly[(i + 1) % poly.len()];
            if (p0.y <= y) != (p1.y <= y) {
                let dy = (p1.y - p0.y) as i64;
                let num = p0.x as i64 * dy + (y - p0.y) as i64 * (p1.x - p0.x) as i64;
                crossings.push(if dy < 0 { (-num, -dy) } else { (num, dy) });
            }
        }
        crossings.sort_by(|a, b| (a.0 * b.1).cmp(&(b.0 * a.1)));
        for span in crossings.chunks_exact(2) {
            let (num0, den0) = span[0];
            let (num1, den1) = span[1];
            let from = (-(-num0).div_euclid(den0)).max(0);
            let to = num1.div_euclid(den1).min(width as i64 - 1);
            for x in from..=to {
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    for i in 0..poly.len() {
        let p0 = poly[i];
        let p1 = poly[(i + 1) % poly.len()];
        draw_line_segment_mut(
            canvas,
            (p0.x as f32, p0.y as f32),
            (p1.x as f32, p1.y as f32),
            color,
        );
    }
}

/// Translate every point by (dx, dy).
pub fn shifted(points: &[Point<i32>], dx: i32, dy: i32) -> Vec<Point<i32>> {
    points.iter().map(|p| Point::new(p.x + dx, p.y + dy)).collect()
}
