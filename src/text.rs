//! Render text into an input image for the pattern pipeline.

use crate::glyphs::GlyphRenderer;
use image::{imageops, DynamicImage, Rgba, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CANVAS_WIDTH: u32 = 2000;
pub const CANVAS_HEIGHT: u32 = 1000;
pub const FONT_PX: f32 = 180.0;
pub const LINE_SPACING: u32 = 24;
pub const CROP_PADDING: u32 = 20;

const INK: [u8; 3] = [0, 0, 0];

/// Which font draws the text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "path")]
pub enum FontSelector {
    /// The engine's resolved font.
    #[default]
    Default,
    /// The built-in bitmap glyphs.
    Builtin,
    /// A font file, falling back like any other font lookup.
    File(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextRequest {
    pub text: String,
    pub font: FontSelector,
}

/// Draw `text` centered on a white canvas and crop to the ink.
pub fn render_text(text: &str, renderer: &GlyphRenderer) -> RgbImage {
    let text = if text.trim().is_empty() { " " } else { text };
    let lines: Vec<_> = text.lines().map(|l| renderer.line(l, FONT_PX)).collect();

    let block_height: u32 = lines.iter().map(|l| l.height).sum::<u32>()
        + LINE_SPACING * (lines.len() as u32).saturating_sub(1);

    let mut layer = RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);
    let mut y = (CANVAS_HEIGHT as i64 - block_height as i64) / 2;
    for line in &lines {
        let x = (CANVAS_WIDTH as i64 - line.width as i64) / 2;
        line.draw_onto(&mut layer, x, y, INK, 255);
        y += (line.height + LINE_SPACING) as i64;
    }

    let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, &layer, 0, 0);
    let canvas = DynamicImage::ImageRgba8(canvas).to_rgb8();

    match ink_bounds(&canvas) {
        Some((x0, y0, x1, y1)) => {
            let left = x0.saturating_sub(CROP_PADDING);
            let top = y0.saturating_sub(CROP_PADDING);
            let right = (x1 + 1 + CROP_PADDING).min(CANVAS_WIDTH);
            let bottom = (y1 + 1 + CROP_PADDING).min(CANVAS_HEIGHT);
            log::debug!(
                "Text rendered {} line(s), cropped to {}x{}",
                lines.len(),
                right - left,
                bottom - top
            );
            imageops::crop_imm(&canvas, left, top, right - left, bottom - top).to_image()
        }
        None => canvas,
    }
}

/// Inclusive bounding box of non-white pixels.
fn ink_bounds(image: &RgbImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in image.enumerate_pixels() {
        if p.0 == [255, 255, 255] {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}
