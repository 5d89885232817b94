//! Glyph rasterization for symbols, legend captions and text input.
//!
//! An outline font (via fontdue) is used when one can be loaded; otherwise,
//! and for any character the font lacks, a built-in 5x7 bitmap font is
//! scaled up instead. Rendering therefore never fails.

use crate::config::EngineConfig;
use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

/// Probed in order when no font path is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\seguisym.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// 8-bit coverage mask. `width`/`height` may be zero for blank glyphs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

impl GlyphBitmap {
    fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            coverage: vec![0; (width * height) as usize],
        }
    }

    pub fn at(&self, x: u32, y: u32) -> u8 {
        self.coverage[(y * self.width + x) as usize]
    }

    fn max_into(&mut self, other: &GlyphBitmap, ox: i64, oy: i64) {
        for y in 0..other.height {
            for x in 0..other.width {
                let tx = ox + x as i64;
                let ty = oy + y as i64;
                if tx < 0 || ty < 0 || tx >= self.width as i64 || ty >= self.height as i64 {
                    continue;
                }
                let idx = (ty as u32 * self.width + tx as u32) as usize;
                self.coverage[idx] = self.coverage[idx].max(other.at(x, y));
            }
        }
    }

    /// Shrink to the rows and columns that carry ink.
    pub fn trimmed(&self) -> GlyphBitmap {
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.at(x, y) > 0 {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        if min_x == u32::MAX {
            return GlyphBitmap::default();
        }
        let mut out = GlyphBitmap::blank(max_x - min_x + 1, max_y - min_y + 1);
        out.max_into(self, -(min_x as i64), -(min_y as i64));
        out
    }

    /// Paint onto a transparent overlay layer; alpha follows coverage.
    pub fn draw_onto(&self, layer: &mut RgbaImage, x: i64, y: i64, rgb: [u8; 3], opacity: u8) {
        let (w, h) = layer.dimensions();
        for gy in 0..self.height {
            for gx in 0..self.width {
                let cov = self.at(gx, gy);
                if cov == 0 {
                    continue;
                }
                let tx = x + gx as i64;
                let ty = y + gy as i64;
                if tx < 0 || ty < 0 || tx >= w as i64 || ty >= h as i64 {
                    continue;
                }
                let alpha = ((cov as u32 * opacity as u32 + 127) / 255) as u8;
                let px = layer.get_pixel_mut(tx as u32, ty as u32);
                if alpha > px[3] {
                    *px = Rgba([rgb[0], rgb[1], rgb[2], alpha]);
                }
            }
        }
    }
}

pub enum GlyphRenderer {
    Outline { font: Font, source: PathBuf },
    Bitmap,
}

impl std::fmt::Debug for GlyphRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlyphRenderer::Outline { source, .. } => {
                f.debug_struct("Outline").field("source", source).finish()
            }
            GlyphRenderer::Bitmap => f.write_str("Bitmap"),
        }
    }
}

static DEFAULT_RENDERER: OnceLock<Arc<GlyphRenderer>> = OnceLock::new();

impl GlyphRenderer {
    /// Renderer for the environment's configuration, resolved on first use.
    pub fn global() -> Arc<GlyphRenderer> {
        DEFAULT_RENDERER
            .get_or_init(|| Arc::new(Self::resolve(EngineConfig::from_env().font_path.as_deref())))
            .clone()
    }

    /// Try the configured font, then well-known system fonts, then fall back
    /// to the built-in bitmap font.
    pub fn resolve(preferred: Option<&Path>) -> Self {
        let candidates = preferred
            .into_iter()
            .map(Path::to_path_buf)
            .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(renderer) => {
                    log::info!("Using font {}", path.display());
                    return renderer;
                }
                Err(err) => log::warn!("Skipping font {}: {}", path.display(), err),
            }
        }

        log::warn!("No usable font found; falling back to built-in bitmap glyphs");
        GlyphRenderer::Bitmap
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let bytes = std::fs::read(path).map_err(|e| format!("Failed to read font: {}", e))?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| format!("Failed to parse font: {}", e))?;
        Ok(GlyphRenderer::Outline {
            font,
            source: path.to_path_buf(),
        })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, GlyphRenderer::Bitmap)
    }

    /// Tight ink box of a single character at roughly `px` pixels tall.
    pub fn glyph(&self, ch: char, px: f32) -> GlyphBitmap {
        match self {
            GlyphRenderer::Outline { font, .. } if font.lookup_glyph_index(ch) != 0 => {
                let (metrics, coverage) = font.rasterize(ch, px.max(1.0));
                GlyphBitmap {
                    width: metrics.width as u32,
                    height: metrics.height as u32,
                    coverage,
                }
                .trimmed()
            }
            _ => bitmap_glyph(ch, px).trimmed(),
        }
    }

    /// One line of text laid out on its baseline. The box spans the full
    /// line height so stacked lines keep even spacing.
    pub fn line(&self, text: &str, px: f32) -> GlyphBitmap {
        let px = px.max(1.0);
        match self {
            GlyphRenderer::Outline { font, .. } => outline_line(font, text, px),
            GlyphRenderer::Bitmap => bitmap_line(text, px),
        }
    }
}

fn outline_line(font: &Font, text: &str, px: f32) -> GlyphBitmap {
    let (ascent, descent) = font
        .horizontal_line_metrics(px)
        .map(|m| (m.ascent, m.descent))
        .unwrap_or((px * 0.8, -px * 0.2));
    let ascent = ascent.ceil() as i64;
    let line_height = (ascent as f32 - descent).ceil().max(1.0) as u32;

    let mut placed = Vec::new();
    let mut pen = 0.0f32;
    let mut right = 0i64;
    for ch in text.chars() {
        if font.lookup_glyph_index(ch) == 0 && !ch.is_whitespace() {
            let glyph = bitmap_glyph(ch, px);
            let x = pen.round() as i64;
            let y = ascent - glyph.height as i64;
            pen += glyph.width as f32 + bitmap_scale(px) as f32;
            right = right.max(x + glyph.width as i64);
            placed.push((glyph, x, y));
            continue;
        }
        let (metrics, coverage) = font.rasterize(ch, px);
        let x = pen.round() as i64 + metrics.xmin as i64;
        let y = ascent - (metrics.height as i64 + metrics.ymin as i64);
        pen += metrics.advance_width;
        right = right.max(x + metrics.width as i64);
        placed.push((
            GlyphBitmap {
                width: metrics.width as u32,
                height: metrics.height as u32,
                coverage,
            },
            x,
            y,
        ));
    }

    let width = (pen.ceil() as i64).max(right).max(1) as u32;
    let mut line = GlyphBitmap::blank(width, line_height);
    for (glyph, x, y) in &placed {
        line.max_into(glyph, *x, *y);
    }
    line
}

// ---------------------- Built-in 5x7 bitmap font ----------------------

fn bitmap_scale(px: f32) -> u32 {
    ((px / 8.0).round() as u32).max(1)
}

fn bitmap_glyph(ch: char, px: f32) -> GlyphBitmap {
    let rows = glyph_rows(ch);
    let scale = bitmap_scale(px);
    let mut out = GlyphBitmap::blank(5 * scale, 7 * scale);
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..5u32 {
            if (bits >> (4 - col)) & 1 == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let x = col * scale + dx;
                    let y = row as u32 * scale + dy;
                    out.coverage[(y * out.width + x) as usize] = 255;
                }
            }
        }
    }
    out
}

fn bitmap_line(text: &str, px: f32) -> GlyphBitmap {
    let scale = bitmap_scale(px);
    let advance = 6 * scale;
    let count = text.chars().count() as u32;
    let width = (count * advance).saturating_sub(scale).max(1);
    let mut line = GlyphBitmap::blank(width, 9 * scale);
    for (i, ch) in text.chars().enumerate() {
        let glyph = bitmap_glyph(ch, px);
        line.max_into(&glyph, (i as u32 * advance) as i64, scale as i64);
    }
    line
}

fn glyph_rows(ch: char) -> [u8; 7] {
    let ch = ch.to_ascii_uppercase();
    BITMAP_5X7
        .iter()
        .find(|(k, _)| *k == ch)
        .or_else(|| BITMAP_5X7.iter().find(|(k, _)| *k == '?'))
        .map(|(_, rows)| *rows)
        .unwrap_or([0; 7])
}

#[rustfmt::skip]
const BITMAP_5X7: &[(char, [u8; 7])] = &[
    // Each row is 5 bits, leftmost column in bit 4
    (' ', [0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000]),
    ('●', [0b00000,0b01110,0b11111,0b11111,0b11111,0b01110,0b00000]),
    ('■', [0b00000,0b11111,0b11111,0b11111,0b11111,0b11111,0b00000]),
    ('▲', [0b00000,0b00100,0b01110,0b01110,0b11111,0b11111,0b00000]),
    ('◆', [0b00000,0b00100,0b01110,0b11111,0b01110,0b00100,0b00000]),
    ('★', [0b00100,0b01110,0b11111,0b01110,0b01010,0b10001,0b00000]),
    ('♥', [0b00000,0b01010,0b11111,0b11111,0b01110,0b00100,0b00000]),
    ('✚', [0b00000,0b00100,0b00100,0b11111,0b00100,0b00100,0b00000]),
    ('✖', [0b00000,0b10001,0b01010,0b00100,0b01010,0b10001,0b00000]),
    ('A', [0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001]),
    ('B', [0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110]),
    ('C', [0b01111,0b10000,0b10000,0b10000,0b10000,0b10000,0b01111]),
    ('D', [0b11110,0b10001,0b10001,0b10001,0b10001,0b10001,0b11110]),
    ('E', [0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111]),
    ('F', [0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000]),
    ('G', [0b01111,0b10000,0b10000,0b10011,0b10001,0b10001,0b01111]),
    ('H', [0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001]),
    ('I', [0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110]),
    ('J', [0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100]),
    ('K', [0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001]),
    ('L', [0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111]),
    ('M', [0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001]),
    ('N', [0b10001,0b11001,0b10101,0b10011,0b10001,0b10001,0b10001]),
    ('O', [0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110]),
    ('P', [0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000]),
    ('Q', [0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101]),
    ('R', [0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001]),
    ('S', [0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110]),
    ('T', [0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100]),
    ('U', [0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110]),
    ('V', [0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100]),
    ('W', [0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010]),
    ('X', [0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001]),
    ('Y', [0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100]),
    ('Z', [0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111]),
    ('0', [0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110]),
    ('1', [0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110]),
    ('2', [0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111]),
    ('3', [0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110]),
    ('4', [0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010]),
    ('5', [0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110]),
    ('6', [0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110]),
    ('7', [0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000]),
    ('8', [0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110]),
    ('9', [0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100]),
    ('?', [0b01110,0b10001,0b00001,0b00010,0b00100,0b00000,0b00100]),
    ('!', [0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100]),
    ('.', [0b00000,0b00000,0b00000,0b00000,0b00000,0b01100,0b01100]),
    (',', [0b00000,0b00000,0b00000,0b00000,0b01100,0b00100,0b01000]),
    (':', [0b00000,0b01100,0b01100,0b00000,0b01100,0b01100,0b00000]),
    ('-', [0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000]),
    ('+', [0b00000,0b00100,0b00100,0b11111,0b00100,0b00100,0b00000]),
    ('\'', [0b00100,0b00100,0b01000,0b00000,0b00000,0b00000,0b00000]),
    ('(', [0b00010,0b00100,0b01000,0b01000,0b01000,0b00100,0b00010]),
    (')', [0b01000,0b00100,0b00010,0b00010,0b00010,0b00100,0b01000]),
    ('/', [0b00001,0b00001,0b00010,0b00100,0b01000,0b10000,0b10000]),
    ('&', [0b01100,0b10010,0b10100,0b01000,0b10101,0b10010,0b01101]),
    ('#', [0b01010,0b11111,0b01010,0b01010,0b11111,0b01010,0b01010]),
];
