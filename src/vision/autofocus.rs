//! Autofocus recovery
//!
//! Watches the per-tick sharpness score stream and decides when a sustained
//! blur episode warrants nudging the device into refocusing. The actual
//! focus-mode toggle is issued by the caller against its video source.

/// How long sharpness must stay below threshold before a refocus fires
const BLUR_DWELL_MS: u64 = 2000;

/// Minimum spacing between refocus attempts
const REFOCUS_COOLDOWN_MS: u64 = 5000;

/// Blur-episode tracker deciding when to issue refocus commands.
///
/// At most one refocus fires per cooldown window, regardless of how long
/// the blur persists.
#[derive(Debug)]
pub struct AutofocusController {
    threshold: u32,
    /// Start of the current blur episode, 0 when not tracking
    low_sharpness_start: u64,
    /// Timestamp of the last refocus attempt, 0 when never attempted
    last_focus_attempt: u64,
}

impl AutofocusController {
    /// Create a controller firing below the given sharpness threshold
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            low_sharpness_start: 0,
            last_focus_attempt: 0,
        }
    }

    /// Feed one sharpness observation. Returns true when the caller should
    /// issue a refocus command now.
    pub fn observe(&mut self, score: u32, now_ms: u64) -> bool {
        if score >= self.threshold {
            self.low_sharpness_start = 0;
            return false;
        }

        if self.low_sharpness_start == 0 {
            self.low_sharpness_start = now_ms;
            return false;
        }

        if now_ms - self.low_sharpness_start > BLUR_DWELL_MS
            && now_ms.saturating_sub(self.last_focus_attempt) > REFOCUS_COOLDOWN_MS
        {
            self.last_focus_attempt = now_ms;
            self.low_sharpness_start = 0;
            return true;
        }

        false
    }

    /// Forget any in-progress blur episode (session pause/stop)
    pub fn reset(&mut self) {
        self.low_sharpness_start = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: u32 = 20;

    #[test]
    fn test_sustained_blur_fires_once() {
        let mut af = AutofocusController::new(THRESHOLD);

        assert!(!af.observe(5, 10_000));
        assert!(!af.observe(5, 11_000));
        // 2.1s of consistent blur, no prior attempt
        assert!(af.observe(5, 12_100));
        // Still blurry right after: new episode starts, cooldown holds
        assert!(!af.observe(5, 12_200));
        assert!(!af.observe(5, 14_400));
    }

    #[test]
    fn test_second_episode_within_cooldown_does_not_fire() {
        let mut af = AutofocusController::new(THRESHOLD);

        assert!(!af.observe(5, 10_000));
        assert!(af.observe(5, 12_100));

        // Sharp recovery, then a fresh blur episode starting 1s later
        assert!(!af.observe(50, 13_000));
        assert!(!af.observe(5, 13_100));
        // Dwell satisfied at 15.3s but only 3.2s since the last attempt
        assert!(!af.observe(5, 15_300));
    }

    #[test]
    fn test_fires_again_after_cooldown() {
        let mut af = AutofocusController::new(THRESHOLD);

        assert!(!af.observe(5, 10_000));
        assert!(af.observe(5, 12_100));

        assert!(!af.observe(5, 12_200));
        // Dwell > 2s and > 5s since last attempt
        assert!(af.observe(5, 17_200));
    }

    #[test]
    fn test_sharp_frame_resets_tracking() {
        let mut af = AutofocusController::new(THRESHOLD);

        assert!(!af.observe(5, 10_000));
        assert!(!af.observe(50, 11_000));
        // Tracking restarted; dwell measured from here, not from 10s
        assert!(!af.observe(5, 11_500));
        assert!(!af.observe(5, 12_100));
        assert!(af.observe(5, 13_600));
    }

    #[test]
    fn test_score_at_threshold_counts_as_sharp() {
        let mut af = AutofocusController::new(THRESHOLD);

        assert!(!af.observe(THRESHOLD, 10_000));
        assert!(!af.observe(THRESHOLD, 13_000));
    }
}
