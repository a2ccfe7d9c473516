//! Per-pixel component ownership.

use image::{ImageBuffer, Luma};

use crate::contour::{Component, ComponentId};
use crate::geom::fill_polygon;

const NO_COMPONENT: i32 = -1;

/// Raster the size of the source image mapping each pixel to the component
/// whose filled interior covers it.
///
/// Where filled interiors overlap, the component drawn last (highest list
/// position) owns the pixel.
#[derive(Debug, Clone)]
pub struct LabelMap {
    cells: ImageBuffer<Luma<i32>, Vec<i32>>,
}

impl LabelMap {
    /// Rasterize `components` in list order onto a `width` x `height` map.
    pub fn build(width: u32, height: u32, components: &[Component]) -> Self {
        let mut cells = ImageBuffer::from_pixel(width, height, Luma([NO_COMPONENT]));
        for component in components {
            // Ids are arena positions, bounded by the polygon count of one image.
            let label = component.id.0 as i32;
            fill_polygon(&mut cells, &component.points, Luma([label]));
        }
        LabelMap { cells }
    }

    pub fn width(&self) -> u32 {
        self.cells.width()
    }

    pub fn height(&self) -> u32 {
        self.cells.height()
    }

    /// Owner of pixel (x, y). `None` for background or out-of-bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<ComponentId> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        match self.cells.get_pixel(x, y).0[0] {
            NO_COMPONENT => None,
            label => Some(ComponentId(label as usize)),
        }
    }

    /// Iterate `(x, y, owner)` over every owned pixel.
    pub fn owned_pixels(&self) -> impl Iterator<Item = (u32, u32, ComponentId)> + '_ {
        self.cells
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] != NO_COMPONENT)
            .map(|(x, y, p)| (x, y, ComponentId(p.0[0] as usize)))
    }
}
