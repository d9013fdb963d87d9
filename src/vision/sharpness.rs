//! Gradient-based sharpness scoring
//!
//! Approximates Laplacian-variance focus measurement with a cheap sum of
//! absolute luma differences between neighboring pixels. Runs once per
//! scheduling tick on a downscaled proxy frame, so it stays allocation-free
//! and deterministic.
//!
//! The score scale is calibrated against the 320px analysis width used by
//! the capture loop. Changing the analysis resolution without recalibrating
//! the sharpness threshold silently shifts capture behavior.

use crate::capture::PixelBuffer;

/// Fraction of the frame skipped on each edge before scanning.
///
/// The outer 20% margins carry vignetting and peripheral noise that would
/// drag the score down on perfectly focused frames.
const EDGE_MARGIN: f32 = 0.2;

/// Fraction of the frame actually scanned along each axis
const SCAN_FRACTION: f32 = 0.6;

/// Score a sampled RGBA frame for optical sharpness.
///
/// Scans the central 60% of the buffer, converts pixels to luma with the
/// standard 0.299/0.587/0.114 weights, and accumulates the absolute luma
/// difference of every interior pixel to its right and lower neighbors.
/// The final score is `(sum / scanned pixel count) * 10`, floored.
///
/// Returns 0 for degenerate input (undersized buffer or scan region);
/// never panics.
pub fn sharpness_score(buffer: &PixelBuffer) -> u32 {
    let width = buffer.width as usize;
    let height = buffer.height as usize;

    if buffer.data.len() < buffer.expected_len() {
        return 0;
    }

    let start_x = (width as f32 * EDGE_MARGIN) as usize;
    let start_y = (height as f32 * EDGE_MARGIN) as usize;
    let scan_w = (width as f32 * SCAN_FRACTION) as usize;
    let scan_h = (height as f32 * SCAN_FRACTION) as usize;

    if scan_w < 2 || scan_h < 2 {
        return 0;
    }

    let data = &buffer.data;
    let luma = |x: usize, y: usize| -> f64 {
        let i = (y * width + x) * 4;
        data[i] as f64 * 0.299 + data[i + 1] as f64 * 0.587 + data[i + 2] as f64 * 0.114
    };

    let mut sum = 0.0f64;
    // Stop one row/column short of the region edge so both neighbor
    // lookups stay inside the scan region.
    for y in 0..scan_h - 1 {
        for x in 0..scan_w - 1 {
            let current = luma(start_x + x, start_y + y);
            let right = luma(start_x + x + 1, start_y + y);
            let below = luma(start_x + x, start_y + y + 1);
            sum += (current - right).abs() + (current - below).abs();
        }
    }

    let pixel_count = (scan_w * scan_h) as f64;
    ((sum / pixel_count) * 10.0) as u32
}
