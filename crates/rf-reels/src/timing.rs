//! Spin protocol timing profiles

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::delay_from_ms;

/// Timing profile identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimingProfile {
    /// Reference cabinet timing
    #[default]
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// No delays (tests, batch simulation)
    Instant,
    /// Scaled or hand-edited
    Custom,
}

/// Delays between the phases of a spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinTiming {
    pub profile: TimingProfile,

    /// Between staging the outcome and starting the reels (ms)
    pub settle_ms: f64,

    /// Time all reels spin before the first stop (ms)
    pub hold_ms: f64,

    /// Delay between consecutive reel stops (ms)
    pub stop_interval_ms: f64,
}

impl SpinTiming {
    pub fn reference() -> Self {
        Self {
            profile: TimingProfile::Normal,
            settle_ms: 100.0,
            hold_ms: 1000.0,
            stop_interval_ms: 200.0,
        }
    }

    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            settle_ms: 50.0,
            hold_ms: 500.0,
            stop_interval_ms: 100.0,
        }
    }

    pub fn instant() -> Self {
        Self {
            profile: TimingProfile::Instant,
            settle_ms: 0.0,
            hold_ms: 0.0,
            stop_interval_ms: 0.0,
        }
    }

    /// Get timing for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal | TimingProfile::Custom => Self::reference(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Instant => Self::instant(),
        }
    }

    /// Scale timing by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            profile: TimingProfile::Custom,
            settle_ms: self.settle_ms * factor,
            hold_ms: self.hold_ms * factor,
            stop_interval_ms: self.stop_interval_ms * factor,
        }
    }

    pub fn settle(&self) -> Duration {
        delay_from_ms(self.settle_ms)
    }

    pub fn hold(&self) -> Duration {
        delay_from_ms(self.hold_ms)
    }

    pub fn stop_interval(&self) -> Duration {
        delay_from_ms(self.stop_interval_ms)
    }

    /// Spin request to last reel stop (ms)
    pub fn total_spin_duration(&self, reel_count: usize) -> f64 {
        self.settle_ms
            + self.hold_ms
            + reel_count.saturating_sub(1) as f64 * self.stop_interval_ms
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("settle_ms", self.settle_ms),
            ("hold_ms", self.hold_ms),
            ("stop_interval_ms", self.stop_interval_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, value));
            }
        }
        Ok(())
    }
}

impl Default for SpinTiming {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_profiles() {
        let normal = SpinTiming::reference();
        let turbo = SpinTiming::turbo();
        let instant = SpinTiming::instant();

        assert!(turbo.hold_ms < normal.hold_ms);
        assert!(turbo.stop_interval_ms < normal.stop_interval_ms);
        assert_eq!(instant.total_spin_duration(5), 0.0);
        assert_eq!(SpinTiming::from_profile(TimingProfile::Turbo), turbo);
    }

    #[test]
    fn test_reference_durations() {
        let timing = SpinTiming::reference();
        assert_eq!(timing.settle(), Duration::from_millis(100));
        assert_eq!(timing.hold(), Duration::from_secs(1));
        assert_eq!(timing.stop_interval(), Duration::from_millis(200));
        // 100 + 1000 + 4 * 200
        assert_eq!(timing.total_spin_duration(5), 1900.0);
    }

    #[test]
    fn test_scaled() {
        let half = SpinTiming::reference().scaled(0.5);
        assert_eq!(half.profile, TimingProfile::Custom);
        assert_eq!(half.hold_ms, 500.0);
    }

    #[test]
    fn test_validate_rejects_negative() {
        let mut timing = SpinTiming::reference();
        timing.hold_ms = -1.0;
        assert!(timing.validate().is_err());
    }
}
