//! Target-dependent correction ceilings
//!
//! How hard the controller may push depends on where the target sits:
//! quieter targets (toward -48 LUFS) allow more boost and less cut, louder
//! targets (toward -10 LUFS) the reverse. This keeps correction proportional
//! to how far the target sits from a neutral loudness.

use calm_core::{MAX_TARGET_LUFS, MIN_TARGET_LUFS};

/// Boost and cut ceilings derived from the configured target loudness
///
/// Invariant: `max_cut_db < 0 < soft_boost_db <= max_boost_db` for every
/// target in the valid range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicLimits {
    /// Hard ceiling on upward correction in dB (3 to 7)
    pub max_boost_db: f64,
    /// Gentler ceiling applied to very quiet passages in dB
    pub soft_boost_db: f64,
    /// Floor on downward correction in dB (-7 to -3)
    pub max_cut_db: f64,
}

impl DynamicLimits {
    /// Compute the limits for a target loudness in LUFS
    ///
    /// Targets outside [-48, -10] are treated as their nearest bound.
    pub fn for_target(target_lufs: f64) -> Self {
        // 0 at -48 LUFS, 1 at -10 LUFS
        let normalized =
            ((target_lufs - MIN_TARGET_LUFS) / (MAX_TARGET_LUFS - MIN_TARGET_LUFS)).clamp(0.0, 1.0);

        let max_boost_db = 3.0 + normalized * 4.0;
        let soft_boost_db = max_boost_db * 0.6;
        let max_cut_db = -(3.0 + (1.0 - normalized) * 4.0);

        Self {
            max_boost_db,
            soft_boost_db,
            max_cut_db,
        }
    }
}
