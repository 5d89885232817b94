//! Developer tool: run the pattern engine on a file or a line of text and
//! write the chart next to a JSON sidecar.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use stitchgrid::{Mode, PatternEngine, PatternError, PatternParams, Result, TextRequest};

#[derive(Parser)]
#[command(name = "pattern-preview")]
#[command(about = "Turn an image or a line of text into a stitch pattern chart")]
struct Cli {
    /// Input image path
    #[arg(required_unless_present = "text")]
    input: Option<PathBuf>,

    /// Render this text instead of reading an image
    #[arg(long, conflicts_with = "input")]
    text: Option<String>,

    /// Output PNG path; the JSON sidecar is written next to it
    #[arg(short, long)]
    output: PathBuf,

    /// Cells along the longer side
    #[arg(long, default_value_t = 80)]
    points: u32,

    /// Maximum palette size
    #[arg(long, default_value_t = 16)]
    colors: u32,

    /// Pixel length of the longer side
    #[arg(long, default_value_t = 2400)]
    target_size: u32,

    /// Smallest cell size in pixels
    #[arg(long, default_value_t = 10)]
    min_cell: u32,

    /// Heavy grid line interval; 0 disables highlighting
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    highlight_every: i32,

    /// Flat logo preprocessing without dithering (always on for --text)
    #[arg(long)]
    logo: bool,

    #[arg(long)]
    no_grid: bool,

    #[arg(long)]
    no_symbols: bool,

    #[arg(long)]
    no_legend: bool,
}

impl Cli {
    fn params(&self) -> PatternParams {
        let mode = if self.logo || self.text.is_some() {
            Mode::Logo
        } else {
            Mode::Photo
        };
        PatternParams {
            points: self.points,
            colors: self.colors,
            mode,
            target_size: self.target_size,
            min_cell: self.min_cell,
            highlight_every: self.highlight_every,
            draw_grid: !self.no_grid,
            draw_symbols: !self.no_symbols,
            draw_legend: !self.no_legend,
            ..PatternParams::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let params = cli.params();
    let engine = PatternEngine::from_env();
    if engine.renderer().is_fallback() {
        log::warn!("No outline font found, symbols use the built-in bitmap font");
    }

    let output = match (&cli.text, &cli.input) {
        (Some(text), _) => engine.convert_text(
            &TextRequest {
                text: text.clone(),
                ..TextRequest::default()
            },
            &params,
        )?,
        (None, Some(path)) => {
            log::info!("Reading {}", path.display());
            engine.convert_bytes(&fs::read(path)?, &params)?
        }
        (None, None) => {
            return Err(PatternError::InvalidParameter(
                "an input path or --text is required".to_string(),
            ))
        }
    };

    fs::write(&cli.output, &output.png)?;
    let sidecar = cli.output.with_extension("json");
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| PatternError::Conversion(e.to_string()))?;
    fs::write(&sidecar, json)?;

    log::info!(
        "Wrote {} ({}x{} cells) and {}",
        cli.output.display(),
        output.metadata.grid_w,
        output.metadata.grid_h,
        sidecar.display()
    );
    Ok(())
}
