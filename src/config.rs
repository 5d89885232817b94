use crate::error::{PatternError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const FONT_PATH_ENV: &str = "STITCHGRID_FONT";
pub const MAX_SOURCE_DIM_ENV: &str = "STITCHGRID_MAX_SOURCE_DIM";

/// Preprocessing and dithering preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Photo,
    Logo,
}

impl Mode {
    /// Photos get error diffusion; logos keep flat cells.
    pub fn dithers(self) -> bool {
        matches!(self, Mode::Photo)
    }
}

/// Square normalization applied before grid planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    Pad,
    Crop,
}

/// How the reduced raster is sampled from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sampling {
    /// Lanczos downscale straight to the grid size.
    Resample,
    /// Most frequent color of each cell's source block.
    DominantBlock,
}

/// Per-conversion parameters, echoed back in the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternParams {
    pub points: u32,
    pub colors: u32,
    pub mode: Mode,
    pub target_size: u32,
    pub draw_grid: bool,
    pub draw_symbols: bool,
    pub draw_legend: bool,
    pub highlight_every: i32,
    pub fit: Option<Fit>,
    pub sampling: Sampling,
    pub min_cell: u32,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            points: 80,
            colors: 16,
            mode: Mode::Photo,
            target_size: 2400,
            draw_grid: true,
            draw_symbols: true,
            draw_legend: true,
            highlight_every: 10,
            fit: None,
            sampling: Sampling::DominantBlock,
            min_cell: 10,
        }
    }
}

impl PatternParams {
    /// Defaults for rendered text: flat logo cells.
    pub fn text_defaults() -> Self {
        Self {
            mode: Mode::Logo,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.points < 1 {
            return Err(PatternError::InvalidParameter(
                "points must be at least 1".to_string(),
            ));
        }
        if self.colors < 1 {
            return Err(PatternError::InvalidParameter(
                "colors must be at least 1".to_string(),
            ));
        }
        if self.target_size < 1 {
            return Err(PatternError::InvalidParameter(
                "target_size must be positive".to_string(),
            ));
        }
        if self.min_cell < 1 {
            return Err(PatternError::InvalidParameter(
                "min_cell must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Process-level settings, resolved once when the engine is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub font_path: Option<PathBuf>,
    /// Sources larger than this on either side are downsized before
    /// sampling. `None` disables the guard.
    pub max_source_dimension: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            max_source_dimension: Some(2048),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let font_path = std::env::var(FONT_PATH_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let max_source_dimension = match std::env::var(MAX_SOURCE_DIM_ENV) {
            Ok(raw) => match raw.trim().parse::<u32>() {
                Ok(0) => None,
                Ok(dim) => Some(dim),
                Err(_) => {
                    log::warn!("Ignoring {}={:?}: not an integer", MAX_SOURCE_DIM_ENV, raw);
                    defaults.max_source_dimension
                }
            },
            Err(_) => defaults.max_source_dimension,
        };
        Self {
            font_path,
            max_source_dimension,
        }
    }
}
