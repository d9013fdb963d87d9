//! Best-of-N frame retention
//!
//! Fixed-capacity cache of the sharpest frames seen since the last batch
//! dispatch. Ranking is recomputed from scratch on every insertion, so only
//! relative score matters, never arrival order.

use crate::capture::frame::RetainedFrame;

/// Fixed-capacity frame cache ordered by descending sharpness.
#[derive(Debug)]
pub struct RetentionBuffer {
    frames: Vec<RetainedFrame>,
    max_frames: usize,
}

impl RetentionBuffer {
    /// Create a buffer holding at most `max_frames` frames
    pub fn new(max_frames: usize) -> Self {
        Self {
            frames: Vec::with_capacity(max_frames + 1),
            max_frames,
        }
    }

    /// Insert a frame, re-rank the whole set, and truncate to capacity.
    ///
    /// Returns false when the frame did not rank in the top `max_frames`
    /// and was discarded.
    pub fn try_insert(&mut self, frame: RetainedFrame) -> bool {
        let id = frame.id;
        self.frames.push(frame);
        self.frames.sort_by(|a, b| b.sharpness.cmp(&a.sharpness));
        self.frames.truncate(self.max_frames);
        self.frames.iter().any(|f| f.id == id)
    }

    /// Retained frames, sharpest first
    pub fn frames(&self) -> &[RetainedFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether the buffer has reached dispatch capacity
    pub fn is_full(&self) -> bool {
        self.frames.len() >= self.max_frames
    }

    /// Drop all retained frames unconditionally
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
