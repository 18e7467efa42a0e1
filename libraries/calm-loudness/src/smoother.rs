//! Asymmetric exponential gain smoothing
//!
//! Attack is fast so the controller recovers quickly when gain should rise
//! (e.g. coming out of a quiet passage); release is slow so loud transients
//! do not pump the gain audibly.

/// Default attack window in milliseconds
pub const DEFAULT_ATTACK_MS: f64 = 120.0;

/// Default release window in milliseconds
pub const DEFAULT_RELEASE_MS: f64 = 650.0;

/// Exponential smoother with separate attack and release time constants
#[derive(Debug, Clone)]
pub struct GainSmoother {
    attack_ms: f64,
    release_ms: f64,
}

impl GainSmoother {
    /// Create a smoother with the default 120 ms attack / 650 ms release
    pub fn new() -> Self {
        Self {
            attack_ms: DEFAULT_ATTACK_MS,
            release_ms: DEFAULT_RELEASE_MS,
        }
    }

    /// Create a smoother with custom time constants in milliseconds
    ///
    /// Windows below 1 ms are treated as 1 ms.
    pub fn with_windows(attack_ms: f64, release_ms: f64) -> Self {
        Self {
            attack_ms: attack_ms.max(1.0),
            release_ms: release_ms.max(1.0),
        }
    }

    /// Attack window in milliseconds
    pub fn attack_ms(&self) -> f64 {
        self.attack_ms
    }

    /// Release window in milliseconds
    pub fn release_ms(&self) -> f64 {
        self.release_ms
    }

    /// Move `previous_db` toward `desired_db` for one tick
    ///
    /// `elapsed_ms` is clamped to a 1 ms minimum to keep the exponent stable
    /// when two ticks land on the same timestamp.
    pub fn smooth(&self, desired_db: f64, previous_db: f64, elapsed_ms: f64, increasing: bool) -> f64 {
        let window_ms = if increasing {
            self.attack_ms
        } else {
            self.release_ms
        };
        let elapsed = elapsed_ms.max(1.0);
        let coeff = (-elapsed / window_ms.max(1.0)).exp();
        desired_db + (previous_db - desired_db) * coeff
    }
}

impl Default for GainSmoother {
    fn default() -> Self {
        Self::new()
    }
}
