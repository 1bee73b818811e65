//! Image enrichment
//!
//! Decoding is behind the `image-decode` feature. Builds without it still
//! process image assets, annotating them with [`UNAVAILABLE_WARNING`].

use serde_json::{json, Map, Value};

use super::content::AssetProcessingError;

pub const UNAVAILABLE_WARNING: &str = "image support not compiled in";

/// Whether this build can decode images
pub const fn is_supported() -> bool {
    cfg!(feature = "image-decode")
}

/// Metadata recorded when the build cannot decode images
pub fn unavailable() -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("warning".to_string(), json!(UNAVAILABLE_WARNING));
    metadata
}

/// Record width, height, color mode and container format
#[cfg(feature = "image-decode")]
pub fn describe(bytes: &[u8]) -> Result<Map<String, Value>, AssetProcessingError> {
    use std::io::Cursor;

    let reader = ::image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(::image::ImageError::IoError)?;
    let format = reader.format().ok_or(AssetProcessingError::UnknownImageFormat)?;
    let decoded = reader.decode()?;

    let mut metadata = Map::new();
    metadata.insert("width".to_string(), json!(decoded.width()));
    metadata.insert("height".to_string(), json!(decoded.height()));
    metadata.insert("mode".to_string(), json!(color_mode(decoded.color())));
    metadata.insert("format".to_string(), json!(format_name(format)));
    Ok(metadata)
}

#[cfg(not(feature = "image-decode"))]
pub fn describe(_bytes: &[u8]) -> Result<Map<String, Value>, AssetProcessingError> {
    Ok(unavailable())
}

/// Conventional short names for pixel layouts (`L`, `LA`, `RGB`, `RGBA`, ...)
#[cfg(feature = "image-decode")]
fn color_mode(color: ::image::ColorType) -> String {
    use ::image::ColorType;

    match color {
        ColorType::L8 => "L".to_string(),
        ColorType::La8 => "LA".to_string(),
        ColorType::Rgb8 => "RGB".to_string(),
        ColorType::Rgba8 => "RGBA".to_string(),
        ColorType::L16 => "I;16".to_string(),
        ColorType::La16 => "LA;16".to_string(),
        ColorType::Rgb16 => "RGB;16".to_string(),
        ColorType::Rgba16 => "RGBA;16".to_string(),
        ColorType::Rgb32F => "RGB;F".to_string(),
        ColorType::Rgba32F => "RGBA;F".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

#[cfg(feature = "image-decode")]
fn format_name(format: ::image::ImageFormat) -> String {
    format!("{:?}", format).to_uppercase()
}
