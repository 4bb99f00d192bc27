//! Upload decoding and transport re-encoding.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, DynamicImage};

use crate::error::{RelayError, Result};

pub const JPEG_QUALITY: u8 = 90;

pub const UPLOAD_MIME: &str = "image/jpeg";
pub const RESULT_MIME: &str = "image/png";

/// Decode raw upload bytes, guessing the format from the content.
pub fn decode_upload(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(RelayError::Decode("Uploaded image is empty".into()));
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Re-encode as JPEG and return the standard base64 of the compressed bytes.
pub fn encode_jpeg_base64(img: &DynamicImage) -> Result<String> {
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))?;
    Ok(STANDARD.encode(&buf))
}

/// Decode an upload and return it as transport-ready JPEG base64.
///
/// CPU-bound; callers on an async runtime run it on the blocking pool.
pub fn transcode_upload(bytes: &[u8]) -> Result<String> {
    let decoded = decode_upload(bytes)?;
    log::debug!(
        "Decoded upload: {}x{} ({} bytes)",
        decoded.width(),
        decoded.height(),
        bytes.len()
    );
    encode_jpeg_base64(&decoded)
}

pub fn data_url(mime: &str, b64: &str) -> String {
    format!("data:{};base64,{}", mime, b64)
}
