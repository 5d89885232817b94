//! Palette extraction and color-to-symbol assignment.

use crate::color::ColorKey;
use image::RgbImage;
use serde::Serialize;
use std::collections::HashMap;

/// Symbols handed out in palette order. Geometric shapes first, then
/// letters, then digits.
pub const SYMBOL_ALPHABET: &[char] = &[
    '●', '■', '▲', '◆', '★', '♥', '✚', '✖', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K',
    'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3',
    '4', '5', '6', '7', '8', '9',
];

/// Drawn for a color that is not in the map.
pub const PLACEHOLDER_SYMBOL: char = '?';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub color: ColorKey,
    pub count: u32,
}

/// Distinct colors of a reduced raster, most frequent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    /// Count colors in one row-major pass; equal counts keep first-seen order.
    pub fn from_image(image: &RgbImage) -> Self {
        let mut slots: HashMap<ColorKey, usize> = HashMap::new();
        let mut entries: Vec<PaletteEntry> = Vec::new();
        for p in image.pixels() {
            let color = ColorKey::from(p);
            let slot = *slots.entry(color).or_insert_with(|| {
                entries.push(PaletteEntry { color, count: 0 });
                entries.len() - 1
            });
            entries[slot].count += 1;
        }
        // stable sort keeps first-seen order among ties
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        Self { entries }
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|e| e.count as u64).sum()
    }
}

/// Forward (color → glyph) and inverse (glyph → color) symbol lookups.
///
/// Once the palette outgrows `SYMBOL_ALPHABET` glyphs repeat; the inverse
/// lookup then answers with the first color that received the glyph.
#[derive(Debug, Clone, Default)]
pub struct SymbolMap {
    by_color: HashMap<ColorKey, char>,
    by_glyph: HashMap<char, ColorKey>,
}

impl SymbolMap {
    pub fn for_palette(palette: &Palette) -> Self {
        let mut map = Self::default();
        for (i, entry) in palette.entries().iter().enumerate() {
            let glyph = SYMBOL_ALPHABET[i % SYMBOL_ALPHABET.len()];
            map.by_color.insert(entry.color, glyph);
            map.by_glyph.entry(glyph).or_insert(entry.color);
        }
        map
    }

    pub fn glyph_for(&self, color: ColorKey) -> char {
        self.by_color
            .get(&color)
            .copied()
            .unwrap_or(PLACEHOLDER_SYMBOL)
    }

    pub fn color_for(&self, glyph: char) -> Option<ColorKey> {
        self.by_glyph.get(&glyph).copied()
    }
}

pub fn build_palette_and_symbols(small: &RgbImage) -> (Palette, SymbolMap) {
    let palette = Palette::from_image(small);
    let symbols = SymbolMap::for_palette(&palette);
    if palette.len() > SYMBOL_ALPHABET.len() {
        log::warn!(
            "Palette has {} colors but only {} symbols; symbols will repeat",
            palette.len(),
            SYMBOL_ALPHABET.len()
        );
    }
    (palette, symbols)
}

/// Legend entry with stitch statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub symbol: String,
    pub hex: String,
    pub rgb: [u8; 3],
    pub stitch_count: u32,
    pub coverage: f32,
}

pub fn legend_entries(palette: &Palette, symbols: &SymbolMap) -> Vec<LegendEntry> {
    let total = palette.total_count().max(1) as f32;
    palette
        .entries()
        .iter()
        .map(|entry| LegendEntry {
            symbol: symbols.glyph_for(entry.color).to_string(),
            hex: entry.color.hex(),
            rgb: entry.color.rgb(),
            stitch_count: entry.count,
            coverage: entry.count as f32 / total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::collections::HashSet;

    #[test]
    fn alphabet_has_unique_glyphs() {
        let unique: HashSet<_> = SYMBOL_ALPHABET.iter().collect();
        assert_eq!(unique.len(), SYMBOL_ALPHABET.len());
        assert_eq!(SYMBOL_ALPHABET.len(), 44);
        assert!(!SYMBOL_ALPHABET.contains(&PLACEHOLDER_SYMBOL));
    }

    #[test]
    fn palette_orders_by_count_then_first_seen() {
        // row-major: blue, red, red, green, blue, green
        let colors = [
            [0, 0, 255],
            [255, 0, 0],
            [255, 0, 0],
            [0, 255, 0],
            [0, 0, 255],
            [0, 255, 0],
        ];
        let img = RgbImage::from_fn(3, 2, |x, y| Rgb(colors[(y * 3 + x) as usize]));
        let palette = Palette::from_image(&img);
        let order: Vec<_> = palette.entries().iter().map(|e| e.color.rgb()).collect();
        assert_eq!(order, vec![[0, 0, 255], [255, 0, 0], [0, 255, 0]]);
        assert!(palette.entries().iter().all(|e| e.count == 2));
    }

    #[test]
    fn symbols_are_injective_within_alphabet() {
        let img = RgbImage::from_fn(30, 1, |x, _| Rgb([x as u8 * 8, 0, 0]));
        let (palette, symbols) = build_palette_and_symbols(&img);
        assert_eq!(palette.len(), 30);
        let glyphs: HashSet<char> = palette
            .entries()
            .iter()
            .map(|e| symbols.glyph_for(e.color))
            .collect();
        assert_eq!(glyphs.len(), 30);
        for entry in palette.entries() {
            let glyph = symbols.glyph_for(entry.color);
            assert_eq!(symbols.color_for(glyph), Some(entry.color));
        }
    }

    #[test]
    fn symbols_wrap_past_alphabet_length() {
        let img = RgbImage::from_fn(50, 1, |x, _| Rgb([x as u8, 0, 0]));
        let (palette, symbols) = build_palette_and_symbols(&img);
        let first = palette.entries()[0].color;
        let wrapped = palette.entries()[SYMBOL_ALPHABET.len()].color;
        assert_eq!(symbols.glyph_for(first), symbols.glyph_for(wrapped));
        assert_eq!(symbols.color_for(SYMBOL_ALPHABET[0]), Some(first));
    }

    #[test]
    fn empty_raster_has_no_legend() {
        let (palette, symbols) = build_palette_and_symbols(&RgbImage::new(0, 0));
        assert!(palette.is_empty());
        assert_eq!(palette.total_count(), 0);
        assert!(legend_entries(&palette, &symbols).is_empty());
    }

    #[test]
    fn unknown_color_gets_placeholder() {
        let symbols = SymbolMap::default();
        assert_eq!(symbols.glyph_for(ColorKey(0x123456)), PLACEHOLDER_SYMBOL);
    }

    #[test]
    fn legend_coverage_sums_to_one() {
        let img = RgbImage::from_fn(4, 1, |x, _| {
            if x == 0 {
                Rgb([1, 2, 3])
            } else {
                Rgb([9, 9, 9])
            }
        });
        let (palette, symbols) = build_palette_and_symbols(&img);
        let legend = legend_entries(&palette, &symbols);
        assert_eq!(legend[0].hex, "#090909");
        assert_eq!(legend[0].stitch_count, 3);
        assert_eq!(legend[0].symbol, "●");
        let total: f32 = legend.iter().map(|l| l.coverage).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }
}
