//! Video Capture Layer
//!
//! Abstracts frame access behind the [`VideoSource`] trait: sample the
//! current frame into a pixel buffer at a requested resolution, and issue a
//! best-effort focus-mode toggle. Device acquisition and release are owned
//! by whoever constructs the source; the pipeline only samples from it.

pub mod encode;
pub mod frame;
pub mod synthetic;

use anyhow::Result;

/// An RGBA pixel buffer sampled from a video source.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    /// Raw RGBA pixel data, 4 bytes per pixel, row-major
    pub data: Vec<u8>,
    /// Buffer width in pixels
    pub width: u32,
    /// Buffer height in pixels
    pub height: u32,
}

impl PixelBuffer {
    /// Create a buffer from raw RGBA bytes
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Expected byte length for the buffer dimensions
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// A live video feed the pipeline can sample frames from.
///
/// Implementations back this with any frame-grab API. Sampling must be
/// cheap enough to run once per scheduling tick.
pub trait VideoSource {
    /// Whether the source has produced at least one decodable frame yet
    fn is_ready(&self) -> bool;

    /// Native frame dimensions, once known
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Sample the current frame into an RGBA buffer of the given size
    fn sample(&mut self, width: u32, height: u32) -> Result<PixelBuffer>;

    /// Best-effort focus-mode toggle to nudge the device into refocusing.
    ///
    /// Switches focus away from continuous mode and back after a short
    /// delay. Callers treat failures as non-fatal.
    fn trigger_refocus(&mut self) -> Result<()>;
}
