//! Image loading: a file path or raw bytes in, a decoded image out.
//!
//! Supports whatever formats the `image` crate is built with (PNG, JPEG,
//! BMP, WebP). The format is guessed from the content first and the file
//! extension second, so a mislabelled file still decodes.

use std::path::Path;

use image::{DynamicImage, ImageReader};
use tracing::debug;

use crate::types::ReadError;

/// Read and decode the image at `path`.
///
/// The file handle lives only for the duration of the call.
///
/// # Errors
///
/// Returns [`ReadError::Open`] if the file cannot be opened or read, and
/// [`ReadError::Decode`] if its contents are not a supported image.
pub fn read_image(path: impl AsRef<Path>) -> Result<DynamicImage, ReadError> {
    let path = path.as_ref();
    let open_error = |source: std::io::Error| ReadError::Open {
        path: path.to_path_buf(),
        source,
    };

    let reader = ImageReader::open(path)
        .map_err(open_error)?
        .with_guessed_format()
        .map_err(open_error)?;
    let image = reader.decode()?;

    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "decoded image",
    );
    Ok(image)
}

/// Decode an image held in memory.
///
/// # Errors
///
/// Returns [`ReadError::Empty`] if `bytes` is empty, and
/// [`ReadError::Decode`] if the format is unrecognized or the data is
/// corrupt.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, ReadError> {
    if bytes.is_empty() {
        return Err(ReadError::Empty);
    }

    let image = image::load_from_memory(bytes)?;
    debug!(
        input_bytes = bytes.len(),
        width = image.width(),
        height = image.height(),
        "decoded image from memory",
    );
    Ok(image)
}
