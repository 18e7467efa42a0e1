//! Combined-gain safety watchdog
//!
//! Runs on its own cadence, independent of the control loop, and polices the
//! product of the normalization and boost stages against an absolute
//! ceiling. Both stages get clamped when the ceiling is breached: either one
//! could be the stage that most recently grew, and clamping only one is not
//! enough if both changed since the last check.

use calm_core::status::StatusSink;
use tracing::warn;

use crate::controller::LoudnessController;
use crate::stages::GainStageCoordinator;

/// Default absolute ceiling on combined linear gain
pub const DEFAULT_GAIN_CEILING: f64 = 3.0;

/// Default check cadence in milliseconds
pub const DEFAULT_INTERVAL_MS: f64 = 200.0;

/// Status text surfaced to the user when the watchdog trips
pub const SAFETY_WARNING_TEXT: &str = "⚠️ Gain limited for safety";

/// Periodic guard over the combined gain of all stages
///
/// The host polls it from the same cooperative scheduler that drives the
/// controller; `poll` returns whether the watchdog wants to stay scheduled.
///
/// # Example
///
/// ```
/// use calm_core::status::NullStatusSink;
/// use calm_loudness::{GainStageCoordinator, LoudnessController, SafetyWatchdog};
///
/// let mut watchdog = SafetyWatchdog::new();
/// let mut controller = LoudnessController::new(-20.0);
/// let mut stages = GainStageCoordinator::new();
/// let mut sink = NullStatusSink;
///
/// let keep_running = watchdog.poll(0.0, true, &mut controller, &mut stages, &mut sink);
/// assert!(keep_running);
/// ```
#[derive(Debug, Clone)]
pub struct SafetyWatchdog {
    ceiling: f64,
    interval_ms: f64,
    next_check_ms: Option<f64>,
}

impl SafetyWatchdog {
    /// Create a watchdog with the default 3.0x ceiling and 200 ms cadence
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_GAIN_CEILING, DEFAULT_INTERVAL_MS)
    }

    /// Create a watchdog with a custom ceiling and cadence
    pub fn with_limits(ceiling: f64, interval_ms: f64) -> Self {
        Self {
            ceiling: ceiling.max(0.0),
            interval_ms: interval_ms.max(1.0),
            next_check_ms: None,
        }
    }

    /// The absolute combined-gain ceiling
    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    /// Run one watchdog cycle
    ///
    /// `any_gain_feature_active` reflects whether boost, normalization, or a
    /// coupled effect is currently enabled; when nothing gain-affecting
    /// remains active the watchdog stops asking to be scheduled. Between due
    /// times the call is a cheap no-op that keeps the schedule alive.
    ///
    /// Returns `true` while the host should keep polling.
    pub fn poll(
        &mut self,
        now_ms: f64,
        any_gain_feature_active: bool,
        controller: &mut LoudnessController,
        stages: &mut GainStageCoordinator,
        sink: &mut dyn StatusSink,
    ) -> bool {
        if !any_gain_feature_active {
            self.next_check_ms = None;
            return false;
        }

        match self.next_check_ms {
            Some(due) if now_ms < due => return true,
            _ => {}
        }
        self.next_check_ms = Some(now_ms + self.interval_ms);

        let combined_gain = stages.combined_gain();
        if combined_gain <= self.ceiling {
            return true;
        }

        // Pull the normalization stage down first, through the controller so
        // its smoothed-gain state stays consistent with the stage value. A
        // destroyed controller no longer owns its stage; clamp it directly.
        if controller
            .force_combined_ceiling(self.ceiling, stages, sink)
            .is_err()
        {
            let norm = stages.normalization_gain();
            if norm * stages.boost_gain() > self.ceiling && norm > 0.0 {
                stages.set_normalization_gain_now(norm.min(self.ceiling));
            }
        }

        // Independently shrink the boost stage to whatever headroom remains
        // after the normalization stage's updated value
        let remaining = self.ceiling / stages.normalization_gain().max(0.01);
        stages.clamp_boost_now(remaining);

        warn!(
            combined_gain,
            ceiling = self.ceiling,
            "Emergency gain reduction triggered"
        );
        sink.status(SAFETY_WARNING_TEXT);
        true
    }
}

impl Default for SafetyWatchdog {
    fn default() -> Self {
        Self::new()
    }
}
