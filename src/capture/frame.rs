//! Frame data structures for retained captures

use uuid::Uuid;

/// A captured frame that passed the sharpness gate.
///
/// Immutable once created; consumed when its batch is dispatched.
#[derive(Debug, Clone)]
pub struct RetainedFrame {
    /// Unique frame identifier
    pub id: Uuid,
    /// JPEG-encoded image payload, bounded to the capture size limit
    pub jpeg: Vec<u8>,
    /// Sharpness score the frame was gated on
    pub sharpness: u32,
    /// Capture timestamp in unix milliseconds
    pub timestamp_ms: u64,
}

impl RetainedFrame {
    /// Create a new retained frame with a fresh identifier
    pub fn new(jpeg: Vec<u8>, sharpness: u32, timestamp_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            jpeg,
            sharpness,
            timestamp_ms,
        }
    }
}
