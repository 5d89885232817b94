//! Grid planning: how many cells a pattern has and how large each one renders.

use crate::error::{PatternError, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridSize {
    pub cols: u32,
    pub rows: u32,
}

impl GridSize {
    pub fn longer(&self) -> u32 {
        self.cols.max(self.rows)
    }

    pub fn cell_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Map the longer source side to `points` cells and scale the shorter side
/// by the aspect ratio, never below one cell.
pub fn compute_grid_size(width: u32, height: u32, points: u32) -> Result<GridSize> {
    if points < 1 {
        return Err(PatternError::InvalidParameter(
            "points must be at least 1".to_string(),
        ));
    }
    if width == 0 || height == 0 {
        return Err(PatternError::DegenerateImage { width, height });
    }

    let longer = width.max(height) as f64;
    let shorter = width.min(height) as f64;
    let minor = ((points as f64 * shorter / longer).round() as u32).clamp(1, points);

    Ok(if width >= height {
        GridSize {
            cols: points,
            rows: minor,
        }
    } else {
        GridSize {
            cols: minor,
            rows: points,
        }
    })
}

/// Pixels per cell so the longer grid side fits `target_size`, floored at
/// `min_cell`. The result may undershoot `target_size` when it is not a
/// multiple of the grid size.
pub fn compute_cell_size(grid: GridSize, target_size: u32, min_cell: u32) -> u32 {
    (target_size / grid.longer().max(1)).max(min_cell)
}

/// Longest side, in pixels, a finished pattern may have.
pub const MAX_OUTPUT_SIDE: u32 = 32_768;

/// Pixel size of the upscaled pattern, rejecting grids and cell sizes whose
/// product would overflow or exceed `MAX_OUTPUT_SIDE`.
pub fn output_size(grid: GridSize, cell_size: u32) -> Result<(u32, u32)> {
    let width = grid.cols.checked_mul(cell_size);
    let height = grid.rows.checked_mul(cell_size);
    match (width, height) {
        (Some(w), Some(h)) if w <= MAX_OUTPUT_SIDE && h <= MAX_OUTPUT_SIDE => Ok((w, h)),
        _ => Err(PatternError::InvalidParameter(format!(
            "{}x{} cells at {}px exceeds the {}px output limit",
            grid.cols, grid.rows, cell_size, MAX_OUTPUT_SIDE
        ))),
    }
}
