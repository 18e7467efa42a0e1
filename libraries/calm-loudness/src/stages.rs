//! Serial gain staging
//!
//! Two independent linear gain stages sit in the output path: the
//! normalization stage (written by the loudness controller) and the manual
//! boost stage (written by the boost-settings recompute). Their product is
//! the combined gain the safety watchdog polices.
//!
//! Each stage carries a short de-zipper ramp so ordinary writes glide to the
//! new value instead of stepping; safety clamps bypass the ramp.

use calm_core::PlayerSettings;

use crate::db_to_linear;

/// De-zipper time constant for ramped writes, in milliseconds
pub const STAGE_RAMP_MS: f64 = 10.0;

/// A single non-negative linear gain scalar with a de-zipper ramp
#[derive(Debug, Clone)]
struct GainStage {
    value: f64,
    target: f64,
}

impl GainStage {
    fn new() -> Self {
        Self {
            value: 1.0,
            target: 1.0,
        }
    }

    /// Ramped write: the value glides toward `target` as the host advances time
    fn set(&mut self, target: f64) {
        self.target = target.max(0.0);
    }

    /// Immediate write, used for user-driven changes and safety clamps
    fn set_now(&mut self, value: f64) {
        let v = value.max(0.0);
        self.value = v;
        self.target = v;
    }

    fn advance(&mut self, elapsed_ms: f64) {
        if (self.value - self.target).abs() < 1e-9 {
            self.value = self.target;
            return;
        }
        let coeff = (-elapsed_ms.max(0.0) / STAGE_RAMP_MS).exp();
        self.value = self.target + (self.value - self.target) * coeff;
    }
}

/// Policy knobs for the manual boost stage
///
/// The stacked-effects cap is a heuristic carried over from the original
/// tuning, not a derived constant; it is configurable for that reason.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostPolicy {
    /// Cap applied to the boost amount when other gain-affecting processing
    /// is active at the same time; `None` disables the scaling entirely
    pub stacked_cap_db: Option<f64>,
    /// Absolute ceiling on the boost stage in linear gain, regardless of settings
    pub max_boost_linear: f64,
}

impl Default for BoostPolicy {
    fn default() -> Self {
        Self {
            stacked_cap_db: Some(8.0),
            max_boost_linear: 3.5,
        }
    }
}

/// Owner of the normalization and boost gain stages
///
/// Write discipline: `set_normalization_gain`/`set_normalization_gain_now`
/// belong to the loudness controller, `recompute_boost` to the
/// boost-settings logic, and `clamp_boost_now` to the safety watchdog. The
/// watchdog may also clamp the normalization stage, but only through the
/// controller's `force_combined_ceiling`.
#[derive(Debug, Clone)]
pub struct GainStageCoordinator {
    normalization: GainStage,
    boost: GainStage,
    policy: BoostPolicy,
}

impl GainStageCoordinator {
    /// Create a coordinator with both stages at unity and the default policy
    pub fn new() -> Self {
        Self::with_policy(BoostPolicy::default())
    }

    /// Create a coordinator with a custom boost policy
    pub fn with_policy(policy: BoostPolicy) -> Self {
        Self {
            normalization: GainStage::new(),
            boost: GainStage::new(),
            policy,
        }
    }

    /// Current normalization stage gain (linear)
    pub fn normalization_gain(&self) -> f64 {
        self.normalization.value
    }

    /// Current boost stage gain (linear)
    pub fn boost_gain(&self) -> f64 {
        self.boost.value
    }

    /// Product of both stages; the quantity the safety ceiling bounds
    pub fn combined_gain(&self) -> f64 {
        self.normalization.value * self.boost.value
    }

    /// The active boost policy
    pub fn policy(&self) -> BoostPolicy {
        self.policy
    }

    /// Ramped write to the normalization stage (controller only)
    pub fn set_normalization_gain(&mut self, linear: f64) {
        self.normalization.set(linear);
    }

    /// Immediate write to the normalization stage (safety clamps, disable ramp start)
    pub fn set_normalization_gain_now(&mut self, linear: f64) {
        self.normalization.set_now(linear);
    }

    /// Ramp the normalization stage back to unity (controller disable)
    pub fn ramp_normalization_to_unity(&mut self) {
        self.normalization.set(1.0);
    }

    /// Recompute the boost stage from settings; returns the applied linear gain
    ///
    /// Boost changes are user-driven and apply immediately; the controller's
    /// smoothed gain carries the burden for loudness-driven movement.
    pub fn recompute_boost(&mut self, settings: &PlayerSettings) -> f64 {
        let mut boost_linear = 1.0;

        if settings.volume_boost_enabled {
            let mut amount_db = settings.volume_boost_db;
            // Reduce headroom pressure when multiple effects stack
            if let Some(cap_db) = self.policy.stacked_cap_db {
                if settings.compressor_enabled || settings.normalization_enabled {
                    amount_db = amount_db.min(cap_db);
                }
            }
            boost_linear = db_to_linear(amount_db);
        }

        // Absolute ceiling regardless of settings
        boost_linear = boost_linear.min(self.policy.max_boost_linear);
        self.boost.set_now(boost_linear);
        boost_linear
    }

    /// Shrink the boost stage to at most `linear` (watchdog only)
    pub fn clamp_boost_now(&mut self, linear: f64) {
        if self.boost.value > linear {
            self.boost.set_now(linear);
        }
    }

    /// Advance both de-zipper ramps by `elapsed_ms`
    ///
    /// The host audio pipeline calls this once per render quantum.
    pub fn advance(&mut self, elapsed_ms: f64) {
        self.normalization.advance(elapsed_ms);
        self.boost.advance(elapsed_ms);
    }
}

impl Default for GainStageCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
