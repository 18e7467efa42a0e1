//! Adaptive loudness normalization for Calm Audio
//!
//! This crate provides:
//! - Short-term RMS loudness metering over a sample window
//! - An adaptive controller that pulls playing audio toward a target loudness
//! - Asymmetric gain smoothing (fast attack, slow release) with a silence gate
//! - Serial gain staging (normalization plus manual boost)
//! - A safety watchdog that bounds the combined gain of all stages
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌─────────────────────┐
//! │ Sample Window│ ──► │ LevelMeter │ ──► │ LoudnessController  │
//! └──────────────┘     └────────────┘     │ (limits + smoother) │
//!                                         └──────────┬──────────┘
//!                                                    ▼
//!                      ┌──────────────┐   ┌──────────────────────┐
//!                      │ Boost Policy │──►│ GainStageCoordinator │──► output gain
//!                      └──────────────┘   └──────────┬───────────┘
//!                                                    ▲
//!                                         ┌──────────┴─────────┐
//!                                         │   SafetyWatchdog   │
//!                                         └────────────────────┘
//! ```
//!
//! The host drives everything from one cooperative scheduler: it feeds the
//! controller a fresh sample window and a monotonic timestamp each tick, and
//! polls the watchdog on its own cadence. Nothing here blocks, and every
//! tick is O(window size).
//!
//! # Example
//!
//! ```
//! use calm_core::status::NullStatusSink;
//! use calm_loudness::{GainStageCoordinator, LoudnessController};
//!
//! let mut controller = LoudnessController::new(-20.0);
//! let mut stages = GainStageCoordinator::new();
//! let mut sink = NullStatusSink;
//!
//! controller.attach_source().unwrap();
//! controller.enable(0.0).unwrap();
//!
//! // One control-loop tick with a quiet window of audio
//! let window = vec![0.05_f32; 2048];
//! controller.tick(16.0, &window, &mut stages, &mut sink).unwrap();
//! assert!(controller.current_gain_db() > 0.0);
//! ```

#![deny(unsafe_code)]

mod controller;
mod error;
mod limits;
mod meter;
mod smoother;
mod stages;
mod watchdog;

pub use controller::{ControllerParams, ControllerState, LoudnessController};
pub use error::{ControllerError, Result};
pub use limits::DynamicLimits;
pub use meter::LevelMeter;
pub use smoother::GainSmoother;
pub use stages::{BoostPolicy, GainStageCoordinator};
pub use watchdog::SafetyWatchdog;

pub use calm_core::{DEFAULT_TARGET_LUFS, MAX_TARGET_LUFS, MIN_TARGET_LUFS};

/// Smallest linear gain `linear_to_db` will report, to keep the log finite
pub const LINEAR_DB_FLOOR: f64 = 1e-6;

/// Convert a gain in dB to a linear multiplier
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert a linear multiplier to dB, flooring tiny values to keep the result finite
pub fn linear_to_db(linear: f64) -> f64 {
    20.0 * linear.max(LINEAR_DB_FLOOR).log10()
}
