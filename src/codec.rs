//! Byte-level helpers around the pipeline: decode, guard, encode.

use crate::error::Result;
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

/// Decode any format the `image` crate understands, with EXIF orientation
/// already applied.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    image.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}

/// Downsize so neither side exceeds `max_dimension`, keeping aspect ratio.
pub fn bound_source(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    if max_dimension == 0 || (image.width() <= max_dimension && image.height() <= max_dimension) {
        return image;
    }
    log::debug!(
        "Downsizing {}x{} source to fit {}px",
        image.width(),
        image.height(),
        max_dimension
    );
    image.resize(max_dimension, max_dimension, FilterType::Triangle)
}
