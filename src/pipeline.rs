//! The conversion entry points: image or text in, pattern PNG and metadata out.

use crate::codec::{bound_source, decode_image, encode_png};
use crate::config::{EngineConfig, PatternParams};
use crate::error::{PatternError, Result};
use crate::geometry::{compute_cell_size, compute_grid_size, output_size, GridSize};
use crate::glyphs::GlyphRenderer;
use crate::overlay::{append_legend, draw_grid, draw_symbols, render_legend, LegendLayout};
use crate::preprocess::{preprocess, PreprocessProfile};
use crate::reduce::{apply_fit, reduce};
use crate::symbols::{build_palette_and_symbols, legend_entries, LegendEntry};
use crate::text::{render_text, FontSelector, TextRequest};
use crate::upscale::upscale;
use image::{DynamicImage, RgbImage, RgbaImage};
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;

/// Summary of a finished conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatternMetadata {
    pub grid_w: u32,
    pub grid_h: u32,
    pub cell_size: u32,
    pub palette_size: usize,
}

/// Composited pattern before encoding.
#[derive(Debug, Clone)]
pub struct RenderedPattern {
    pub image: RgbaImage,
    /// One pixel per cell, after quantization.
    pub cells: RgbImage,
    pub metadata: PatternMetadata,
    pub legend: Vec<LegendEntry>,
}

/// Complete pattern result returned to the caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternOutput {
    #[serde(skip)]
    pub png: Vec<u8>,
    pub metadata: PatternMetadata,
    pub params: PatternParams,
    pub legend: Vec<LegendEntry>,
    pub processing_time_ms: u64,
}

/// Holds the resolved font and source guard; cheap to share between
/// request handlers since nothing in it changes after construction.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    config: EngineConfig,
    renderer: Arc<GlyphRenderer>,
}

impl PatternEngine {
    pub fn new(config: EngineConfig) -> Self {
        let renderer = Arc::new(GlyphRenderer::resolve(config.font_path.as_deref()));
        Self { config, renderer }
    }

    pub fn with_renderer(config: EngineConfig, renderer: Arc<GlyphRenderer>) -> Self {
        Self { config, renderer }
    }

    /// Configuration from the environment, sharing the process-wide font.
    pub fn from_env() -> Self {
        Self::with_renderer(EngineConfig::from_env(), GlyphRenderer::global())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn renderer(&self) -> &GlyphRenderer {
        &self.renderer
    }

    pub fn convert(&self, image: &DynamicImage, params: &PatternParams) -> Result<PatternOutput> {
        let start = Instant::now();
        log::info!(
            "Converting {}x{} image: {} points, {} colors, mode {:?}",
            image.width(),
            image.height(),
            params.points,
            params.colors,
            params.mode
        );

        let rendered = self.render(image, params)?;
        let png = encode_png(&DynamicImage::ImageRgba8(rendered.image))?;
        let processing_time_ms = start.elapsed().as_millis() as u64;

        log::info!(
            "Pattern done: {}x{} cells at {}px, {} colors, {} bytes, {}ms",
            rendered.metadata.grid_w,
            rendered.metadata.grid_h,
            rendered.metadata.cell_size,
            rendered.metadata.palette_size,
            png.len(),
            processing_time_ms
        );

        Ok(PatternOutput {
            png,
            metadata: rendered.metadata,
            params: params.clone(),
            legend: rendered.legend,
            processing_time_ms,
        })
    }

    pub fn convert_bytes(&self, bytes: &[u8], params: &PatternParams) -> Result<PatternOutput> {
        let image = decode_image(bytes)?;
        self.convert(&image, params)
    }

    /// Render the text first, then convert it like any other image.
    pub fn convert_text(
        &self,
        request: &TextRequest,
        params: &PatternParams,
    ) -> Result<PatternOutput> {
        let image = match &request.font {
            FontSelector::Default => render_text(&request.text, &self.renderer),
            FontSelector::Builtin => render_text(&request.text, &GlyphRenderer::Bitmap),
            FontSelector::File(path) => {
                render_text(&request.text, &GlyphRenderer::resolve(Some(path.as_path())))
            }
        };
        self.convert(&DynamicImage::ImageRgb8(image), params)
    }

    /// Run every stage up to, but not including, encoding.
    pub fn render(&self, image: &DynamicImage, params: &PatternParams) -> Result<RenderedPattern> {
        params.validate()?;
        if image.width() == 0 || image.height() == 0 {
            return Err(PatternError::DegenerateImage {
                width: image.width(),
                height: image.height(),
            });
        }

        let source: Cow<'_, DynamicImage> = match self.config.max_source_dimension {
            Some(max) if image.width() > max || image.height() > max => {
                Cow::Owned(bound_source(image.clone(), max))
            }
            _ => Cow::Borrowed(image),
        };

        let mut prepared = preprocess(&source, &PreprocessProfile::for_mode(params.mode));
        if let Some(fit) = params.fit {
            prepared = apply_fit(prepared, fit);
        }

        let grid = compute_grid_size(prepared.width(), prepared.height(), params.points)?;
        // reject oversized output before any grid-sized raster is allocated
        output_size(grid, compute_cell_size(grid, params.target_size, params.min_cell))?;
        let cells = reduce(&prepared, grid, params.sampling, params.colors, params.mode);
        drop(prepared);

        let (big, cell_size) = upscale(&cells, params.target_size, params.min_cell);
        let (palette, symbols) = build_palette_and_symbols(&cells);
        log::debug!(
            "Grid {}x{}, cell {}px, palette {}",
            grid.cols,
            grid.rows,
            cell_size,
            palette.len()
        );

        let mut composed = DynamicImage::ImageRgb8(big).to_rgba8();
        if params.draw_grid {
            draw_grid(&mut composed, grid, cell_size, params.highlight_every);
        }
        if params.draw_symbols {
            draw_symbols(&mut composed, &cells, &symbols, cell_size, &self.renderer);
        }
        if params.draw_legend && !palette.is_empty() {
            let layout = LegendLayout::new(palette.len(), composed.width(), cell_size);
            let panel = render_legend(&palette, &symbols, &layout, composed.width(), &self.renderer);
            composed = append_legend(&composed, &panel);
        }

        let metadata = PatternMetadata {
            grid_w: grid.cols,
            grid_h: grid.rows,
            cell_size,
            palette_size: palette.len(),
        };
        Ok(RenderedPattern {
            image: composed,
            cells,
            metadata,
            legend: legend_entries(&palette, &symbols),
        })
    }
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RenderedPattern {
    pub fn grid(&self) -> GridSize {
        GridSize {
            cols: self.metadata.grid_w,
            rows: self.metadata.grid_h,
        }
    }
}
