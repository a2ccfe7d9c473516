//! Raster output for segmented subwords.
//!
//! Per-subword crops (full-size or tight), a vertical stack of all subwords
//! separated by divider rules, and a colored debug overlay on the source.

use image::{imageops, DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use rand::Rng;
use tracing::debug;

use crate::bitmap::{Binarizer, INK};
use crate::config::SegmentConfig;
use crate::error::SegmentError;
use crate::geom::{fill_polygon, shifted, BoundingBox};
use crate::order::OrderedSubwords;

const PAPER: u8 = 255;
const INK_DRAWN: u8 = 0;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
/// Color of the rule between stacked subwords.
pub const DIVIDER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// Blank row, two accent rows, blank row.
pub const DIVIDER_HEIGHT: u32 = 4;

/// One full-size raster per subword, ink drawn black on white.
pub fn render_crops(width: u32, height: u32, subwords: &OrderedSubwords) -> Vec<GrayImage> {
    (0..subwords.len())
        .map(|i| {
            let mut img = GrayImage::from_pixel(width, height, Luma([PAPER]));
            for c in subwords.group_components(i) {
                fill_polygon(&mut img, &c.points, Luma([INK_DRAWN]));
            }
            img
        })
        .collect()
}

/// One raster per subword, cropped to the subword's bounding box.
///
/// Pixel-identical to the matching region of [`render_crops`].
pub fn render_tight_crops(subwords: &OrderedSubwords) -> Result<Vec<GrayImage>, SegmentError> {
    (0..subwords.len())
        .map(|i| {
            let bbox = checked_bbox(subwords, i)?;
            let mut img = GrayImage::from_pixel(bbox.width(), bbox.height(), Luma([PAPER]));
            for c in subwords.group_components(i) {
                let points = shifted(&c.points, -bbox.min_x, -bbox.min_y);
                fill_polygon(&mut img, &points, Luma([INK_DRAWN]));
            }
            Ok(img)
        })
        .collect()
}

/// Stack every subword top-to-bottom in reading order.
///
/// The width is the widest subword; narrower ones are centered, with the odd
/// pixel of padding on the right. A divider separates consecutive subwords.
/// No subwords yields a 0x0 image.
///
/// Unlike [`render_crops`] this takes no source image shape: the output size
/// depends only on the subwords' bounding boxes.
pub fn render_vertical_composite(subwords: &OrderedSubwords) -> Result<RgbImage, SegmentError> {
    let boxes = (0..subwords.len())
        .map(|i| checked_bbox(subwords, i))
        .collect::<Result<Vec<_>, _>>()?;
    let Some(width) = boxes.iter().map(|b| b.width()).max() else {
        return Ok(RgbImage::new(0, 0));
    };
    let dividers = boxes.len().saturating_sub(1) as u32;
    let height = boxes.iter().map(|b| b.height()).sum::<u32>() + dividers * DIVIDER_HEIGHT;

    let mut out = RgbImage::from_pixel(width, height, WHITE);
    let mut top = 0u32;
    for (i, bbox) in boxes.iter().enumerate() {
        let left = (width - bbox.width()) / 2;
        let mut crop = RgbImage::from_pixel(width, bbox.height(), WHITE);
        for c in subwords.group_components(i) {
            let points = shifted(&c.points, left as i32 - bbox.min_x, -bbox.min_y);
            fill_polygon(&mut crop, &points, BLACK);
        }
        imageops::replace(&mut out, &crop, 0, top as i64);
        top += bbox.height();

        if i + 1 < boxes.len() {
            for y in top + 1..top + 3 {
                for x in 0..width {
                    out.put_pixel(x, y, DIVIDER_COLOR);
                }
            }
            top += DIVIDER_HEIGHT;
        }
    }

    debug!(width, height, subwords = boxes.len(), "vertical composite");
    Ok(out)
}

/// Draw each subword in its own color over the binarized source, then
/// downscale to fit `config.overlay_max_width` x `config.overlay_max_height`.
///
/// Consecutive subwords never share a color while the palette has more than
/// one. No subwords yields a 0x0 image.
pub fn render_debug_overlay<R: Rng + ?Sized>(
    image: &DynamicImage,
    subwords: &OrderedSubwords,
    binarizer: &dyn Binarizer,
    config: &SegmentConfig,
    rng: &mut R,
) -> Result<RgbImage, SegmentError> {
    if subwords.is_empty() {
        return Ok(RgbImage::new(0, 0));
    }
    config.validate()?;

    let binary = binarizer.binarize(image);
    let mut canvas = RgbImage::from_fn(binary.width(), binary.height(), |x, y| {
        if binary.get_pixel(x, y).0[0] == INK {
            BLACK
        } else {
            WHITE
        }
    });

    let mut previous: Option<usize> = None;
    for i in 0..subwords.len() {
        let pick = pick_color(&config.palette, previous, rng)
            .ok_or_else(|| SegmentError::InvalidConfig("palette is empty".into()))?;
        previous = Some(pick);
        for c in subwords.group_components(i) {
            fill_polygon(&mut canvas, &c.points, config.palette[pick]);
        }
    }

    Ok(fit_within(canvas, config.overlay_max_width, config.overlay_max_height))
}

/// Random palette index whose color differs from the previous pick.
///
/// Retries at most `palette.len()` times, then takes the next differing
/// entry after `previous`. A palette of one color always returns it;
/// an empty palette returns `None`.
pub fn pick_color<R: Rng + ?Sized>(
    palette: &[Rgb<u8>],
    previous: Option<usize>,
    rng: &mut R,
) -> Option<usize> {
    let n = palette.len();
    if n == 0 {
        return None;
    }
    let Some(prev) = previous.filter(|&p| p < n) else {
        return Some(rng.gen_range(0..n));
    };
    for _ in 0..n {
        let candidate = rng.gen_range(0..n);
        if palette[candidate] != palette[prev] {
            return Some(candidate);
        }
    }
    (1..n)
        .map(|step| (prev + step) % n)
        .find(|&i| palette[i] != palette[prev])
        .or(Some(prev))
}

/// Downscale (never upscale) so neither side exceeds its bound.
fn fit_within(img: RgbImage, max_w: u32, max_h: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img;
    }
    let scale = (max_h as f64 / h as f64).min(max_w as f64 / w as f64);
    if scale >= 1.0 {
        return img;
    }
    let new_w = ((w as f64 * scale).round() as u32).clamp(1, max_w);
    let new_h = ((h as f64 * scale).round() as u32).clamp(1, max_h);
    debug!(from_w = w, from_h = h, new_w, new_h, "overlay downscale");
    imageops::resize(&img, new_w, new_h, imageops::FilterType::Nearest)
}

fn checked_bbox(subwords: &OrderedSubwords, index: usize) -> Result<BoundingBox, SegmentError> {
    let bbox = subwords.group_bbox(index).ok_or_else(|| {
        SegmentError::invariant(format!("subword {} references no known component", index))
    })?;
    if bbox.width() == 0 || bbox.height() == 0 {
        return Err(SegmentError::invariant(format!(
            "subword {} has a degenerate {}x{} bounding box",
            index,
            bbox.width(),
            bbox.height()
        )));
    }
    Ok(bbox)
}
