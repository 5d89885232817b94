pub mod codec;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod glyphs;
pub mod overlay;
pub mod pipeline;
pub mod preprocess;
pub mod quantize;
pub mod reduce;
pub mod symbols;
pub mod text;
pub mod upscale;

pub use config::{EngineConfig, Fit, Mode, PatternParams, Sampling};
pub use error::{PatternError, Result};
pub use geometry::GridSize;
pub use glyphs::GlyphRenderer;
pub use pipeline::{PatternEngine, PatternMetadata, PatternOutput, RenderedPattern};
pub use symbols::LegendEntry;
pub use text::{FontSelector, TextRequest};
