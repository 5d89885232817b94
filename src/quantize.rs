//! Median-cut color reduction with optional Floyd–Steinberg dithering.

use crate::color::{squared_distance, ColorKey};
use image::imageops::{self, ColorMap};
use image::{Rgb, RgbImage};
use std::collections::HashMap;

/// One box of the median-cut partition: distinct colors with pixel counts.
#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<([u8; 3], u32)>,
}

impl ColorBox {
    fn population(&self) -> u64 {
        self.colors.iter().map(|(_, n)| *n as u64).sum()
    }

    /// Channel with the largest spread and that spread.
    fn widest_channel(&self) -> (usize, u8) {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        for (rgb, _) in &self.colors {
            for c in 0..3 {
                min[c] = min[c].min(rgb[c]);
                max[c] = max[c].max(rgb[c]);
            }
        }
        (0..3)
            .map(|c| (c, max[c] - min[c]))
            .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best })
    }

    fn can_split(&self) -> bool {
        self.colors.len() > 1
    }

    /// Split at the population median along the widest channel. Both halves
    /// keep at least one color.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.colors
            .sort_by_key(|(rgb, _)| (rgb[channel], ColorKey::from_rgb(*rgb)));

        let half = self.population() / 2;
        let mut acc = 0u64;
        let mut cut = 1;
        for (i, (_, n)) in self.colors.iter().enumerate() {
            acc += *n as u64;
            if acc >= half {
                cut = i + 1;
                break;
            }
        }
        let cut = cut.clamp(1, self.colors.len() - 1);
        let upper = self.colors.split_off(cut);
        (self, ColorBox { colors: upper })
    }

    fn average(&self) -> [u8; 3] {
        let total = self.population().max(1);
        let mut sums = [0u64; 3];
        for (rgb, n) in &self.colors {
            for c in 0..3 {
                sums[c] += rgb[c] as u64 * *n as u64;
            }
        }
        [
            ((sums[0] + total / 2) / total) as u8,
            ((sums[1] + total / 2) / total) as u8,
            ((sums[2] + total / 2) / total) as u8,
        ]
    }
}

/// Reduced palette plus the box membership of every source color.
#[derive(Debug, Clone)]
pub struct MedianCutPalette {
    colors: Vec<[u8; 3]>,
    membership: HashMap<ColorKey, usize>,
}

impl MedianCutPalette {
    pub fn build(image: &RgbImage, max_colors: u32) -> Self {
        let mut index: HashMap<ColorKey, usize> = HashMap::new();
        let mut counts: Vec<([u8; 3], u32)> = Vec::new();
        for p in image.pixels() {
            let slot = *index.entry(ColorKey::from(p)).or_insert_with(|| {
                counts.push((p.0, 0));
                counts.len() - 1
            });
            counts[slot].1 += 1;
        }

        let mut boxes = vec![ColorBox { colors: counts }];
        while boxes.len() < max_colors as usize {
            let candidate = boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.can_split())
                .max_by(|(ia, a), (ib, b)| {
                    a.widest_channel()
                        .1
                        .cmp(&b.widest_channel().1)
                        .then(a.population().cmp(&b.population()))
                        // earlier box wins ties
                        .then(ib.cmp(ia))
                })
                .map(|(i, _)| i);

            let Some(i) = candidate else { break };
            let (low, high) = boxes.swap_remove(i).split();
            boxes.push(low);
            boxes.push(high);
        }

        let mut colors = Vec::with_capacity(boxes.len());
        let mut membership = HashMap::new();
        for b in boxes.iter().filter(|b| !b.colors.is_empty()) {
            let slot = colors.len();
            colors.push(b.average());
            for (rgb, _) in &b.colors {
                membership.insert(ColorKey::from_rgb(*rgb), slot);
            }
        }

        Self { colors, membership }
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    fn nearest(&self, rgb: [u8; 3]) -> usize {
        self.colors
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| squared_distance(**c, rgb))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

impl ColorMap for MedianCutPalette {
    type Color = Rgb<u8>;

    fn index_of(&self, color: &Rgb<u8>) -> usize {
        match self.membership.get(&ColorKey::from(color)) {
            Some(&slot) => slot,
            None => self.nearest(color.0),
        }
    }

    fn lookup(&self, index: usize) -> Option<Rgb<u8>> {
        self.colors.get(index).map(|c| Rgb(*c))
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Rgb<u8>) {
        let slot = self.index_of(color);
        if let Some(mapped) = self.colors.get(slot) {
            *color = Rgb(*mapped);
        }
    }
}

/// Reduce `image` to at most `colors` distinct colors. With `dither` the
/// quantization error is diffused to neighbors; without it every source
/// color snaps to its own box average.
pub fn quantize(mut image: RgbImage, colors: u32, dither: bool) -> RgbImage {
    let palette = MedianCutPalette::build(&image, colors.max(1));
    if dither {
        imageops::dither(&mut image, &palette);
    } else {
        for p in image.pixels_mut() {
            palette.map_color(p);
        }
    }
    log::debug!(
        "Quantized {}x{} to {} palette colors (dither={})",
        image.width(),
        image.height(),
        palette.colors().len(),
        dither
    );
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn distinct(image: &RgbImage) -> usize {
        image.pixels().map(ColorKey::from).collect::<HashSet<_>>().len()
    }

    fn fifty_color_strip() -> RgbImage {
        RgbImage::from_fn(50, 4, |x, _| {
            let v = (x * 5) as u8;
            Rgb([v, v, v])
        })
    }

    #[test]
    fn reduces_fifty_colors_to_exactly_sixteen() {
        let src = fifty_color_strip();
        assert_eq!(distinct(&src), 50);
        let out = quantize(src, 16, false);
        assert_eq!(distinct(&out), 16);
    }

    #[test]
    fn dithered_output_stays_within_palette() {
        let src = RgbImage::from_fn(40, 40, |x, y| Rgb([(x * 6) as u8, (y * 6) as u8, 90]));
        let out = quantize(src, 8, true);
        assert!(distinct(&out) <= 8);
    }

    #[test]
    fn fewer_source_colors_than_requested() {
        let src = RgbImage::from_fn(6, 6, |x, _| {
            if x < 3 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let out = quantize(src.clone(), 16, false);
        assert_eq!(out, src);
    }

    #[test]
    fn single_color_budget_averages_everything() {
        let src = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([200, 100, 50])
            }
        });
        let out = quantize(src, 1, false);
        assert!(out.pixels().all(|p| *p == Rgb([100, 50, 25])));
    }

    #[test]
    fn split_keeps_both_halves_non_empty() {
        let heavy = ColorBox {
            colors: vec![([0, 0, 0], 1000), ([255, 0, 0], 1)],
        };
        let (low, high) = heavy.split();
        assert_eq!(low.colors.len(), 1);
        assert_eq!(high.colors.len(), 1);
    }
}
