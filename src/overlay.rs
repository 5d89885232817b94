//! Grid, symbol and legend overlays.
//!
//! Each pass paints a transparent RGBA layer and alpha-blends it onto the
//! pattern, so base cell colors are only ever tinted, never overwritten.

use crate::color::{contrasting_ink, ColorKey};
use crate::geometry::GridSize;
use crate::glyphs::{GlyphBitmap, GlyphRenderer};
use crate::symbols::{Palette, SymbolMap};
use image::{imageops, Rgba, RgbaImage, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use std::collections::HashMap;

/// Symbol height relative to the cell.
const SYMBOL_SCALE: f32 = 0.55;
const SYMBOL_OPACITY: u8 = 230;
/// Legend entries never shrink below this many pixels per unit.
const MIN_LEGEND_UNIT: u32 = 16;
/// Swatch, gap, glyph, gap: three units per entry.
const LEGEND_ENTRY_UNITS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Normal,
    Highlight,
}

impl Stroke {
    fn width(self, cell_size: u32) -> u32 {
        match self {
            Stroke::Normal => (cell_size / 16).max(1),
            Stroke::Highlight => (cell_size / 8).max(2),
        }
    }

    fn color(self) -> Rgba<u8> {
        match self {
            Stroke::Normal => Rgba([0, 0, 0, 60]),
            Stroke::Highlight => Rgba([0, 0, 0, 170]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLine {
    pub orientation: Orientation,
    pub index: u32,
    /// Pixel offset of the cell boundary.
    pub position: u32,
    pub stroke: Stroke,
}

/// One line per cell boundary: `cols + 1` vertical, `rows + 1` horizontal.
/// `highlight_every <= 0` leaves every line at normal weight.
pub fn plan_grid_lines(grid: GridSize, cell_size: u32, highlight_every: i32) -> Vec<GridLine> {
    let stroke_for = |index: u32| {
        if highlight_every > 0 && index % highlight_every as u32 == 0 {
            Stroke::Highlight
        } else {
            Stroke::Normal
        }
    };

    let vertical = (0..=grid.cols).map(|i| GridLine {
        orientation: Orientation::Vertical,
        index: i,
        position: i * cell_size,
        stroke: stroke_for(i),
    });
    let horizontal = (0..=grid.rows).map(|i| GridLine {
        orientation: Orientation::Horizontal,
        index: i,
        position: i * cell_size,
        stroke: stroke_for(i),
    });
    vertical.chain(horizontal).collect()
}

pub fn draw_grid(base: &mut RgbaImage, grid: GridSize, cell_size: u32, highlight_every: i32) {
    let (width, height) = base.dimensions();
    let mut layer = RgbaImage::new(width, height);

    let lines = plan_grid_lines(grid, cell_size, highlight_every);
    // Heavy strokes last so they sit on top where lines cross.
    let ordered = lines
        .iter()
        .filter(|l| l.stroke == Stroke::Normal)
        .chain(lines.iter().filter(|l| l.stroke == Stroke::Highlight));

    for line in ordered {
        let stroke_w = line.stroke.width(cell_size);
        let extent = match line.orientation {
            Orientation::Vertical => width,
            Orientation::Horizontal => height,
        };
        let thickness = stroke_w.min(extent);
        // center on the boundary, kept inside the image at both edges
        let start = line
            .position
            .saturating_sub(stroke_w / 2)
            .min(extent - thickness);
        let rect = match line.orientation {
            Orientation::Vertical => Rect::at(start as i32, 0).of_size(thickness, height),
            Orientation::Horizontal => Rect::at(0, start as i32).of_size(width, thickness),
        };
        draw_filled_rect_mut(&mut layer, rect, line.stroke.color());
    }

    imageops::overlay(base, &layer, 0, 0);
}

/// Stamp each cell's symbol, centered on the glyph's ink box.
///
/// Nothing is drawn when a glyph would not fit inside one cell, which
/// happens with the bitmap font below roughly 7px cells.
pub fn draw_symbols(
    base: &mut RgbaImage,
    small: &RgbImage,
    symbols: &SymbolMap,
    cell_size: u32,
    renderer: &GlyphRenderer,
) {
    let px = cell_size as f32 * SYMBOL_SCALE;
    let mut cache: HashMap<char, GlyphBitmap> = HashMap::new();
    for pixel in small.pixels() {
        let ch = symbols.glyph_for(ColorKey::from(pixel));
        cache.entry(ch).or_insert_with(|| renderer.glyph(ch, px));
    }

    if let Some((ch, glyph)) = cache
        .iter()
        .find(|(_, g)| g.width > cell_size || g.height > cell_size)
    {
        log::debug!(
            "Skipping symbols: '{}' is {}x{} but cells are {}px",
            ch,
            glyph.width,
            glyph.height,
            cell_size
        );
        return;
    }

    let mut layer = RgbaImage::new(base.width(), base.height());
    for (cx, cy, pixel) in small.enumerate_pixels() {
        let color = ColorKey::from(pixel);
        let Some(glyph) = cache.get(&symbols.glyph_for(color)) else {
            continue;
        };
        if glyph.width == 0 {
            continue;
        }
        let x = (cx * cell_size) as i64 + (cell_size as i64 - glyph.width as i64) / 2;
        let y = (cy * cell_size) as i64 + (cell_size as i64 - glyph.height as i64) / 2;
        glyph.draw_onto(&mut layer, x, y, contrasting_ink(color.rgb()), SYMBOL_OPACITY);
    }

    imageops::overlay(base, &layer, 0, 0);
}

/// Geometry of the legend panel. Entries fill rows as wide as the panel;
/// for a fixed width the panel only grows as cells get larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendLayout {
    pub unit: u32,
    pub margin: u32,
    pub title_height: u32,
    pub row_height: u32,
    pub per_row: u32,
    pub rows: u32,
    pub width: u32,
    pub height: u32,
}

impl LegendLayout {
    pub fn new(palette_len: usize, panel_width: u32, cell_size: u32) -> Self {
        let unit = cell_size.max(MIN_LEGEND_UNIT);
        let margin = unit / 2;
        let title_height = unit + unit / 2;
        let row_height = unit + unit / 2;
        let per_row = (panel_width.saturating_sub(2 * margin) / (LEGEND_ENTRY_UNITS * unit))
            .clamp(1, (palette_len as u32).max(1));
        let rows = (palette_len as u32).div_ceil(per_row);
        Self {
            unit,
            margin,
            title_height,
            row_height,
            per_row,
            rows,
            width: 2 * margin + per_row * LEGEND_ENTRY_UNITS * unit,
            height: 2 * margin + title_height + rows * row_height,
        }
    }

    /// Top-left corner of entry `i`.
    pub fn entry_origin(&self, i: u32) -> (u32, u32) {
        let col = i % self.per_row;
        let row = i / self.per_row;
        (
            self.margin + col * LEGEND_ENTRY_UNITS * self.unit,
            self.margin + self.title_height + row * self.row_height,
        )
    }
}

pub fn render_legend(
    palette: &Palette,
    symbols: &SymbolMap,
    layout: &LegendLayout,
    panel_width: u32,
    renderer: &GlyphRenderer,
) -> RgbaImage {
    let width = panel_width.max(layout.width);
    let mut panel = RgbaImage::from_pixel(width, layout.height, Rgba([255, 255, 255, 255]));
    let mut layer = RgbaImage::new(width, layout.height);
    let unit = layout.unit;

    let title = format!("Legend: {} colors", palette.len());
    let caption = renderer.line(&title, unit as f32 * 0.9);
    caption.draw_onto(
        &mut layer,
        layout.margin as i64,
        layout.margin as i64 + (layout.title_height as i64 - caption.height as i64) / 2,
        [40, 40, 40],
        255,
    );

    for (i, entry) in palette.entries().iter().enumerate() {
        let (x, y) = layout.entry_origin(i as u32);
        let [r, g, b] = entry.color.rgb();
        let swatch = Rect::at(x as i32, y as i32).of_size(unit, unit);
        draw_filled_rect_mut(&mut panel, swatch, Rgba([r, g, b, 255]));
        draw_hollow_rect_mut(&mut panel, swatch, Rgba([90, 90, 90, 255]));

        let ch = symbols.glyph_for(entry.color);
        let glyph = renderer.glyph(ch, unit as f32 * 0.8);
        let gx = (x + unit + unit / 2) as i64 + (unit as i64 - glyph.width as i64) / 2;
        let gy = y as i64 + (unit as i64 - glyph.height as i64) / 2;
        glyph.draw_onto(&mut layer, gx, gy, [20, 20, 20], 255);
    }

    imageops::overlay(&mut panel, &layer, 0, 0);
    panel
}

/// Stack the pattern above its legend panel on one white canvas.
pub fn append_legend(pattern: &RgbaImage, panel: &RgbaImage) -> RgbaImage {
    let width = pattern.width().max(panel.width());
    let height = pattern.height() + panel.height();
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    imageops::replace(&mut canvas, pattern, 0, 0);
    imageops::replace(&mut canvas, panel, 0, pattern.height() as i64);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::build_palette_and_symbols;
    use image::Rgb;

    fn count(lines: &[GridLine], orientation: Orientation) -> usize {
        lines.iter().filter(|l| l.orientation == orientation).count()
    }

    #[test]
    fn plans_one_line_per_boundary() {
        let grid = GridSize { cols: 12, rows: 7 };
        let lines = plan_grid_lines(grid, 10, 5);
        assert_eq!(count(&lines, Orientation::Vertical), 13);
        assert_eq!(count(&lines, Orientation::Horizontal), 8);
        let last = lines
            .iter()
            .filter(|l| l.orientation == Orientation::Vertical)
            .last()
            .unwrap();
        assert_eq!(last.position, 120);
    }

    #[test]
    fn highlights_every_nth_line() {
        let grid = GridSize { cols: 20, rows: 20 };
        let lines = plan_grid_lines(grid, 10, 10);
        let heavy: Vec<u32> = lines
            .iter()
            .filter(|l| l.orientation == Orientation::Vertical && l.stroke == Stroke::Highlight)
            .map(|l| l.index)
            .collect();
        assert_eq!(heavy, vec![0, 10, 20]);
    }

    #[test]
    fn zero_or_negative_highlight_disables_heavy_lines() {
        let grid = GridSize { cols: 20, rows: 20 };
        for every in [0, -3] {
            let lines = plan_grid_lines(grid, 10, every);
            assert!(lines.iter().all(|l| l.stroke == Stroke::Normal));
        }
    }

    #[test]
    fn grid_darkens_boundaries_but_not_cell_interiors() {
        let grid = GridSize { cols: 4, rows: 4 };
        let mut base = RgbaImage::from_pixel(80, 80, Rgba([255, 255, 255, 255]));
        draw_grid(&mut base, grid, 20, 2);
        assert!(base.get_pixel(40, 10)[0] < 255);
        assert!(base.get_pixel(20, 10)[0] < 255);
        // index 2 is heavy, index 1 is light
        assert!(base.get_pixel(40, 10)[0] < base.get_pixel(20, 10)[0]);
        assert_eq!(base.get_pixel(10, 10), &Rgba([255, 255, 255, 255]));
        // closing line is clamped inside the image
        assert!(base.get_pixel(79, 10)[0] < 255);
    }

    #[test]
    fn symbols_land_inside_their_cells() {
        let small = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let (_, symbols) = build_palette_and_symbols(&small);
        let mut base = RgbaImage::from_fn(40, 20, |x, _| {
            if x < 20 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        draw_symbols(&mut base, &small, &symbols, 20, &GlyphRenderer::Bitmap);
        // light cell gets dark ink near its center, dark cell gets light ink
        assert!(base.get_pixel(10, 10)[0] < 128);
        assert!(base.get_pixel(30, 10)[0] > 128);
        // corners untouched
        assert_eq!(base.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(base.get_pixel(39, 19), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn zero_highlight_paints_every_line_alike() {
        let grid = GridSize { cols: 6, rows: 6 };
        let mut base = RgbaImage::from_pixel(120, 120, Rgba([255, 255, 255, 255]));
        draw_grid(&mut base, grid, 20, 0);
        let reference = *base.get_pixel(20, 10);
        assert!(reference[0] < 255);
        for i in 0..=6u32 {
            let x = (i * 20).min(119);
            assert_eq!(base.get_pixel(x, 10), &reference, "vertical line {i}");
            let y = (i * 20).min(119);
            assert_eq!(base.get_pixel(10, y), &reference, "horizontal line {i}");
        }
    }

    #[test]
    fn symbols_never_spill_into_neighbor_cells() {
        // dark center cell takes light ink, light neighbors take dark ink
        let small = RgbImage::from_fn(3, 3, |x, y| {
            if (x, y) == (1, 1) {
                Rgb([60, 60, 60])
            } else {
                Rgb([200, 200, 200])
            }
        });
        let (_, symbols) = build_palette_and_symbols(&small);
        for cell in 1..=8 {
            let mut base = RgbaImage::from_fn(3 * cell, 3 * cell, |x, y| {
                let [r, g, b] = small.get_pixel(x / cell, y / cell).0;
                Rgba([r, g, b, 255])
            });
            draw_symbols(&mut base, &small, &symbols, cell, &GlyphRenderer::Bitmap);
            for (x, y, p) in base.enumerate_pixels() {
                if (x / cell, y / cell) == (1, 1) {
                    assert!(p[0] >= 60, "dark ink leaked into center at cell {cell}");
                } else {
                    assert!(p[0] <= 200, "light ink leaked into neighbor at cell {cell}");
                }
            }
        }
    }

    #[test]
    fn tiny_cells_get_no_symbols() {
        let small = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let (_, symbols) = build_palette_and_symbols(&small);
        for cell in 1..=4 {
            let mut base = RgbaImage::from_pixel(4 * cell, 4 * cell, Rgba([255, 255, 255, 255]));
            draw_symbols(&mut base, &small, &symbols, cell, &GlyphRenderer::Bitmap);
            assert!(base.pixels().all(|p| p.0 == [255, 255, 255, 255]), "cell {cell}");
        }
    }

    #[test]
    fn legend_height_never_shrinks_with_cell_size() {
        let mut previous = 0;
        for cell in 1..64 {
            let layout = LegendLayout::new(23, 800, cell);
            assert!(layout.height >= previous, "cell {cell}");
            previous = layout.height;
        }
    }

    #[test]
    fn legend_fits_pattern_width_for_regular_cells() {
        let layout = LegendLayout::new(16, 80 * 30, 30);
        assert!(layout.width <= 80 * 30);
        assert_eq!(layout.rows, 1);
    }

    #[test]
    fn narrow_panels_wrap_entries_onto_more_rows() {
        let wide = LegendLayout::new(12, 1000, 20);
        let narrow = LegendLayout::new(12, 200, 20);
        assert_eq!(wide.rows, 1);
        assert_eq!(narrow.per_row, 3);
        assert_eq!(narrow.rows, 4);
        assert!(narrow.width <= 200);
        // a single entry is always laid out, even when it does not fit
        assert_eq!(LegendLayout::new(5, 10, 20).per_row, 1);
    }

    #[test]
    fn legend_panel_shows_every_swatch() {
        let small = RgbImage::from_fn(3, 1, |x, _| Rgb([x as u8 * 100, 50, 50]));
        let (palette, symbols) = build_palette_and_symbols(&small);
        let layout = LegendLayout::new(palette.len(), 600, 20);
        let panel = render_legend(&palette, &symbols, &layout, 600, &GlyphRenderer::Bitmap);
        assert_eq!(panel.dimensions(), (600, layout.height));
        for (i, entry) in palette.entries().iter().enumerate() {
            let (x, y) = layout.entry_origin(i as u32);
            let [r, g, b] = entry.color.rgb();
            assert_eq!(panel.get_pixel(x + 5, y + 5), &Rgba([r, g, b, 255]));
        }
    }

    #[test]
    fn append_legend_stacks_vertically() {
        let pattern = RgbaImage::from_pixel(50, 40, Rgba([1, 2, 3, 255]));
        let panel = RgbaImage::from_pixel(70, 10, Rgba([9, 9, 9, 255]));
        let combined = append_legend(&pattern, &panel);
        assert_eq!(combined.dimensions(), (70, 50));
        assert_eq!(combined.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
        assert_eq!(combined.get_pixel(60, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(combined.get_pixel(60, 45), &Rgba([9, 9, 9, 255]));
    }
}
