//! Capture encoding
//!
//! Resizes gated captures to a bounded dimension and re-encodes them as
//! lossy JPEG to keep the remote OCR payload small.

use anyhow::{anyhow, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use super::PixelBuffer;

/// Maximum edge length of an encoded capture, in pixels
pub const MAX_CAPTURE_DIM: u32 = 1024;

/// JPEG quality for encoded captures (0-100)
pub const JPEG_QUALITY: u8 = 80;

/// Resize a sampled frame to fit within `max_dim` on its longest edge and
/// encode it as JPEG. Frames already within bounds are encoded as-is.
pub fn encode_capture(buffer: &PixelBuffer, max_dim: u32, quality: u8) -> Result<Vec<u8>> {
    let rgba = RgbaImage::from_raw(buffer.width, buffer.height, buffer.data.clone())
        .ok_or_else(|| anyhow!("pixel buffer does not match its dimensions"))?;

    let mut img = DynamicImage::ImageRgba8(rgba);
    if buffer.width.max(buffer.height) > max_dim {
        // resize() preserves aspect ratio within the max_dim bounding box
        img = img.resize(max_dim, max_dim, FilterType::Triangle);
    }

    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality))
        .context("JPEG encoding failed")?;

    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_buffer(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::new(vec![128u8; (width * height * 4) as usize], width, height)
    }

    #[test]
    fn test_encode_produces_decodable_jpeg() {
        let buffer = solid_buffer(64, 48);
        let jpeg = encode_capture(&buffer, MAX_CAPTURE_DIM, JPEG_QUALITY).unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn test_encode_bounds_longest_edge() {
        let buffer = solid_buffer(2048, 512);
        let jpeg = encode_capture(&buffer, MAX_CAPTURE_DIM, JPEG_QUALITY).unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 1024);
        assert_eq!(decoded.height(), 256);
    }

    #[test]
    fn test_encode_skips_resize_within_bounds() {
        let buffer = solid_buffer(800, 600);
        let jpeg = encode_capture(&buffer, MAX_CAPTURE_DIM, JPEG_QUALITY).unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 800);
        assert_eq!(decoded.height(), 600);
    }

    #[test]
    fn test_encode_rejects_mismatched_buffer() {
        let buffer = PixelBuffer::new(vec![0u8; 16], 64, 48);
        assert!(encode_capture(&buffer, MAX_CAPTURE_DIM, JPEG_QUALITY).is_err());
    }
}
