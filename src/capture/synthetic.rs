//! Synthetic test-pattern video source
//!
//! Generates a drifting checkerboard so the full pipeline can be exercised
//! without a physical camera. The pattern has strong luma gradients and
//! scores well above any sane sharpness threshold; switching it to blurred
//! mode produces a flat field that scores zero.

use anyhow::Result;

use super::{PixelBuffer, VideoSource};

/// Test-pattern source with a controllable blur mode.
#[derive(Debug)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    phase: u32,
    blurred: bool,
    refocus_count: u32,
}

impl SyntheticSource {
    /// Create a source with the given native resolution
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            phase: 0,
            blurred: false,
            refocus_count: 0,
        }
    }

    /// Switch between the sharp checkerboard and a flat (blurred) field
    pub fn set_blurred(&mut self, blurred: bool) {
        self.blurred = blurred;
    }

    /// Number of refocus toggles requested so far
    pub fn refocus_count(&self) -> u32 {
        self.refocus_count
    }

    fn pixel_value(&self, x: u32, y: u32) -> u8 {
        if self.blurred {
            return 96;
        }
        // 8px checkerboard drifting one pixel per sampled frame
        let shifted = x.wrapping_add(self.phase);
        if ((shifted / 8) + (y / 8)) % 2 == 0 {
            235
        } else {
            16
        }
    }
}

impl VideoSource for SyntheticSource {
    fn is_ready(&self) -> bool {
        true
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }

    fn sample(&mut self, width: u32, height: u32) -> Result<PixelBuffer> {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = self.pixel_value(x, y);
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        self.phase = self.phase.wrapping_add(1);
        Ok(PixelBuffer::new(data, width, height))
    }

    fn trigger_refocus(&mut self) -> Result<()> {
        self.refocus_count += 1;
        Ok(())
    }
}
