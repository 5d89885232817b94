use crate::geometry::{compute_cell_size, GridSize};
use image::RgbImage;

/// Replicate every reduced pixel into a `cell_size` square block.
///
/// Returns the enlarged raster and the cell size used. Nearest-neighbor
/// replication keeps cell edges exactly on multiples of `cell_size`, which
/// the grid and symbol overlays rely on.
pub fn upscale(small: &RgbImage, target_size: u32, min_cell: u32) -> (RgbImage, u32) {
    let grid = GridSize {
        cols: small.width(),
        rows: small.height(),
    };
    let cell_size = compute_cell_size(grid, target_size, min_cell).max(1);
    let big = RgbImage::from_fn(grid.cols * cell_size, grid.rows * cell_size, |x, y| {
        *small.get_pixel(x / cell_size, y / cell_size)
    });
    (big, cell_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn output_is_exact_multiple_of_grid() {
        let small = RgbImage::from_fn(80, 80, |x, y| Rgb([x as u8, y as u8, 0]));
        let (big, cell) = upscale(&small, 2400, 10);
        assert_eq!(cell, 30);
        assert_eq!(big.dimensions(), (2400, 2400));
    }

    #[test]
    fn every_cell_is_uniform() {
        let small = RgbImage::from_fn(5, 3, |x, y| Rgb([(x * 40) as u8, (y * 70) as u8, 9]));
        let (big, cell) = upscale(&small, 53, 1);
        assert_eq!(cell, 10);
        assert_eq!(big.dimensions(), (50, 30));
        for (x, y, p) in big.enumerate_pixels() {
            assert_eq!(p, small.get_pixel(x / cell, y / cell));
        }
    }

    #[test]
    fn min_cell_floor_can_exceed_target() {
        let small = RgbImage::new(100, 40);
        let (big, cell) = upscale(&small, 200, 8);
        assert_eq!(cell, 8);
        assert_eq!(big.dimensions(), (800, 320));
    }
}
