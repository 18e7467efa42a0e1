//! Persisted player settings
//!
//! The settings document is a flat JSON object written by the host on every
//! user-driven change and read once at session start. Values are clamped to
//! their valid ranges on load so a hand-edited or corrupted document can
//! never push the audio chain outside safe bounds.
//!
//! Older documents stored the normalization target as a 10-100 "percent"
//! value under `normalizationTarget`; loading migrates it onto the LUFS
//! range and drops the legacy field on the next save.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{DEFAULT_BOOST_DB, DEFAULT_TARGET_LUFS, MAX_TARGET_LUFS, MIN_TARGET_LUFS};

/// Lowest allowed manual boost amount in dB
pub const MIN_BOOST_DB: f64 = 0.0;

/// Highest allowed manual boost amount in dB
pub const MAX_BOOST_DB: f64 = 20.0;

/// Persisted player settings
///
/// Only the fields the loudness engine cares about live here; host-side
/// cosmetics (overlay colors, panel positions) belong to the host.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettings {
    /// Whether the manual volume boost stage is enabled
    pub volume_boost_enabled: bool,
    /// Manual boost amount in dB (0 to 20)
    #[serde(rename = "volumeBoostAmount")]
    pub volume_boost_db: f64,
    /// Whether adaptive loudness normalization is enabled
    #[serde(rename = "volumeNormalizationEnabled")]
    pub normalization_enabled: bool,
    /// Normalization target in LUFS (-48 to -10)
    pub normalization_target_lufs: f64,
    /// Whether the host's dynamics compressor is enabled
    ///
    /// The compressor itself is host-side; the engine only uses this flag
    /// for the stacked-effects boost policy and watchdog arming.
    pub compressor_enabled: bool,
}

/// Raw on-disk shape, including the legacy target field
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSettings {
    volume_boost_enabled: bool,
    #[serde(rename = "volumeBoostAmount")]
    volume_boost_db: f64,
    #[serde(rename = "volumeNormalizationEnabled")]
    normalization_enabled: bool,
    normalization_target_lufs: Option<f64>,
    /// Legacy percentage-based target (10-100)
    #[serde(rename = "normalizationTarget")]
    legacy_target_percent: Option<f64>,
    compressor_enabled: bool,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            volume_boost_enabled: false,
            volume_boost_db: DEFAULT_BOOST_DB,
            normalization_enabled: false,
            normalization_target_lufs: None,
            legacy_target_percent: None,
            compressor_enabled: false,
        }
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            volume_boost_enabled: false,
            volume_boost_db: DEFAULT_BOOST_DB,
            normalization_enabled: false,
            normalization_target_lufs: DEFAULT_TARGET_LUFS,
            compressor_enabled: false,
        }
    }
}

impl PlayerSettings {
    /// Parse settings from a JSON document, migrating and clamping as needed
    ///
    /// The current `normalizationTargetLufs` field wins when both it and the
    /// legacy `normalizationTarget` percentage are present.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let raw: RawSettings = serde_json::from_str(json)?;

        let target_lufs = match (raw.normalization_target_lufs, raw.legacy_target_percent) {
            (Some(lufs), _) => lufs,
            (None, Some(percent)) => {
                let lufs = convert_legacy_target(percent);
                debug!(percent, lufs, "Migrated legacy percentage target to LUFS");
                lufs
            }
            (None, None) => DEFAULT_TARGET_LUFS,
        };

        let mut settings = Self {
            volume_boost_enabled: raw.volume_boost_enabled,
            volume_boost_db: raw.volume_boost_db,
            normalization_enabled: raw.normalization_enabled,
            normalization_target_lufs: target_lufs,
            compressor_enabled: raw.compressor_enabled,
        };
        settings.sanitize();
        Ok(settings)
    }

    /// Serialize settings to a JSON document
    ///
    /// The legacy `normalizationTarget` field is never written back.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| crate::SettingsError::SerializeError(e.to_string()))
    }

    /// Clamp all fields to their valid ranges
    pub fn sanitize(&mut self) {
        if !self.normalization_target_lufs.is_finite() {
            self.normalization_target_lufs = DEFAULT_TARGET_LUFS;
        }
        self.normalization_target_lufs = self
            .normalization_target_lufs
            .clamp(MIN_TARGET_LUFS, MAX_TARGET_LUFS);

        if !self.volume_boost_db.is_finite() {
            self.volume_boost_db = DEFAULT_BOOST_DB;
        }
        self.volume_boost_db = self.volume_boost_db.clamp(MIN_BOOST_DB, MAX_BOOST_DB);
    }

    /// Set the normalization target, clamped to the valid LUFS range
    pub fn set_target_lufs(&mut self, lufs: f64) {
        self.normalization_target_lufs = lufs.clamp(MIN_TARGET_LUFS, MAX_TARGET_LUFS);
    }

    /// Step the normalization target up or down by `step_db`, staying in range
    ///
    /// Returns the new target so callers can display it.
    pub fn nudge_target_lufs(&mut self, step_db: f64) -> f64 {
        self.set_target_lufs(self.normalization_target_lufs + step_db);
        self.normalization_target_lufs
    }

    /// Step the boost amount up or down by `step_db`, staying in range
    pub fn nudge_boost_db(&mut self, step_db: f64) -> f64 {
        self.volume_boost_db = (self.volume_boost_db + step_db).clamp(MIN_BOOST_DB, MAX_BOOST_DB);
        self.volume_boost_db
    }

    /// Whether any gain-affecting feature is currently enabled
    ///
    /// Drives safety watchdog arming: the watchdog only schedules itself
    /// while this is true.
    pub fn any_gain_feature_enabled(&self) -> bool {
        self.volume_boost_enabled || self.normalization_enabled || self.compressor_enabled
    }
}

/// Map a legacy percentage target (10-100) onto the LUFS range (-48 to -10)
fn convert_legacy_target(percent: f64) -> f64 {
    if !percent.is_finite() {
        return DEFAULT_TARGET_LUFS;
    }
    let clamped = percent.clamp(10.0, 100.0);
    let mapped = MIN_TARGET_LUFS + ((clamped - 10.0) / 90.0) * (MAX_TARGET_LUFS - MIN_TARGET_LUFS);
    mapped.clamp(MIN_TARGET_LUFS, MAX_TARGET_LUFS)
}
