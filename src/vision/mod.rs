//! Vision Layer
//!
//! Cheap per-tick frame analysis: a gradient-based sharpness heuristic and
//! the autofocus-recovery controller that watches its output.

pub mod autofocus;
pub mod sharpness;
