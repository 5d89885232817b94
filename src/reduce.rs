//! Sampling the source down to one pixel per pattern cell, then color reduction.

use crate::color::ColorKey;
use crate::config::{Fit, Mode, Sampling};
use crate::geometry::GridSize;
use crate::quantize::quantize;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::collections::HashMap;

/// Side length of the thumbnail each source block is reduced to before
/// picking its dominant color.
const BLOCK_SAMPLE: u32 = 16;

/// Produce the `cols x rows` color-reduced raster.
pub fn reduce(
    source: &RgbImage,
    grid: GridSize,
    sampling: Sampling,
    colors: u32,
    mode: Mode,
) -> RgbImage {
    let sampled = match sampling {
        Sampling::Resample => resample(source, grid),
        Sampling::DominantBlock => dominant_block_sample(source, grid),
    };
    quantize(sampled, colors, mode.dithers())
}

pub fn resample(source: &RgbImage, grid: GridSize) -> RgbImage {
    imageops::resize(source, grid.cols, grid.rows, FilterType::Lanczos3)
}

/// Source range `[start, end)` covered by cell `index` of `cells` along an
/// axis of `len` pixels. Always at least one pixel wide.
fn block_span(index: u32, cells: u32, len: u32) -> (u32, u32) {
    let start = ((index as u64 * len as u64) / cells as u64) as u32;
    let end = (((index as u64 + 1) * len as u64) / cells as u64) as u32;
    let start = start.min(len.saturating_sub(1));
    (start, end.clamp(start + 1, len.max(start + 1)))
}

pub fn dominant_block_sample(source: &RgbImage, grid: GridSize) -> RgbImage {
    let (width, height) = source.dimensions();
    let mut out = RgbImage::new(grid.cols, grid.rows);

    for cy in 0..grid.rows {
        let (y0, y1) = block_span(cy, grid.rows, height);
        for cx in 0..grid.cols {
            let (x0, x1) = block_span(cx, grid.cols, width);
            let block = imageops::crop_imm(source, x0, y0, x1 - x0, y1 - y0).to_image();
            let sample = imageops::resize(&block, BLOCK_SAMPLE, BLOCK_SAMPLE, FilterType::Triangle);
            out.put_pixel(cx, cy, dominant_color(&sample));
        }
    }
    out
}

/// Most frequent color; ties go to the color seen first in row-major order.
pub fn dominant_color(sample: &RgbImage) -> Rgb<u8> {
    let mut counts: HashMap<ColorKey, (u32, usize)> = HashMap::new();
    for (order, p) in sample.pixels().enumerate() {
        counts.entry(ColorKey::from(p)).or_insert((0, order)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (na, oa)), (_, (nb, ob))| na.cmp(nb).then(ob.cmp(oa)))
        .map(|(key, _)| key.pixel())
        .unwrap_or(Rgb([255, 255, 255]))
}

/// Make the source square before grid planning.
pub fn apply_fit(source: RgbImage, fit: Fit) -> RgbImage {
    let (width, height) = source.dimensions();
    if width == height {
        return source;
    }
    let side_max = width.max(height);
    let side_min = width.min(height);
    match fit {
        Fit::Pad => {
            let mut canvas = RgbImage::from_pixel(side_max, side_max, Rgb([255, 255, 255]));
            let x = (side_max - width) / 2;
            let y = (side_max - height) / 2;
            imageops::replace(&mut canvas, &source, x as i64, y as i64);
            canvas
        }
        Fit::Crop => {
            let x = (width - side_min) / 2;
            let y = (height - side_min) / 2;
            imageops::crop_imm(&source, x, y, side_min, side_min).to_image()
        }
    }
}
