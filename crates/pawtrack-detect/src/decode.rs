//! Image decoding with input limits

use image::{DynamicImage, GenericImageView, ImageReader, Limits};
use pawtrack_core::{Error, Result};
use std::io::Cursor;

/// Maximum accepted upload size (20 MiB)
pub const MAX_INPUT_BYTES: usize = 20 * 1024 * 1024;

/// Maximum edge length accepted by the decoder
pub const MAX_DIMENSION: u32 = 8192;

/// Maximum decoder allocation (512 MiB)
const MAX_ALLOC_BYTES: u64 = 512 * 1024 * 1024;

/// Decode raw file bytes into an image.
///
/// The format is sniffed from the content, not from a file name.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(Error::decode("empty input"));
    }
    if bytes.len() > MAX_INPUT_BYTES {
        return Err(Error::decode(format!(
            "input is {} bytes (max: {})",
            bytes.len(),
            MAX_INPUT_BYTES
        )));
    }

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::decode(e.to_string()))?;

    if reader.format().is_none() {
        return Err(Error::decode("unsupported image format"));
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DIMENSION);
    limits.max_image_height = Some(MAX_DIMENSION);
    limits.max_alloc = Some(MAX_ALLOC_BYTES);
    reader.limits(limits);

    let image = reader.decode().map_err(|e| Error::decode(e.to_string()))?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::decode(format!("invalid dimensions {}x{}", width, height)));
    }

    Ok(image)
}
