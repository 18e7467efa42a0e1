//! Calm Audio Core
//!
//! Platform-agnostic types shared between the loudness engine and its hosts.
//!
//! This crate provides:
//! - **Settings**: the persisted player settings document (`PlayerSettings`),
//!   including range clamping and legacy-format migration on load
//! - **Status reporting**: the `StatusSink` trait hosts implement to surface
//!   short-lived, human-readable status text (gain readouts, safety warnings)
//! - **Error Handling**: `SettingsError` and a crate `Result` type
//!
//! # Example
//!
//! ```
//! use calm_core::PlayerSettings;
//!
//! let mut settings = PlayerSettings::default();
//! settings.set_target_lufs(-23.0);
//! let json = settings.to_json().unwrap();
//!
//! let restored = PlayerSettings::from_json(&json).unwrap();
//! assert!((restored.normalization_target_lufs - (-23.0)).abs() < 0.001);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod settings;
pub mod status;

pub use error::{Result, SettingsError};
pub use settings::PlayerSettings;
pub use status::{NullStatusSink, StatusSink};

/// Lowest allowed normalization target in LUFS
pub const MIN_TARGET_LUFS: f64 = -48.0;

/// Highest allowed normalization target in LUFS
pub const MAX_TARGET_LUFS: f64 = -10.0;

/// Default normalization target in LUFS
pub const DEFAULT_TARGET_LUFS: f64 = -20.0;

/// Default manual boost amount in dB
pub const DEFAULT_BOOST_DB: f64 = 6.0;
