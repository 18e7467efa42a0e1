//! Short-term RMS loudness metering
//!
//! A pragmatic RMS approximation of loudness, not ITU-R BS.1770 metering.
//! The meter is a pure function of the sample window it is handed; the
//! controller runs it exactly once per control-loop tick.

/// Default measurement floor in dB, reported for silent or degenerate input
pub const DEFAULT_FLOOR_DB: f64 = -120.0;

/// RMS level meter over a fixed-size time-domain sample window
///
/// # Example
///
/// ```
/// use calm_loudness::LevelMeter;
///
/// let meter = LevelMeter::new();
/// let window = vec![0.5_f32; 1024];
/// let db = meter.measure(&window);
/// assert!((db - (-6.02)).abs() < 0.1);
/// ```
#[derive(Debug, Clone)]
pub struct LevelMeter {
    floor_db: f64,
}

impl LevelMeter {
    /// Create a meter with the default -120 dB floor
    pub fn new() -> Self {
        Self {
            floor_db: DEFAULT_FLOOR_DB,
        }
    }

    /// Create a meter with a custom measurement floor
    pub fn with_floor_db(floor_db: f64) -> Self {
        Self { floor_db }
    }

    /// The configured measurement floor in dB
    pub fn floor_db(&self) -> f64 {
        self.floor_db
    }

    /// Measure the RMS level of a sample window in dB
    ///
    /// Samples are expected in the [-1, 1] range. Returns the floor for an
    /// empty window, all-zero input, or any non-finite intermediate value.
    pub fn measure(&self, window: &[f32]) -> f64 {
        if window.is_empty() {
            return self.floor_db;
        }

        let mut sum = 0.0_f64;
        for &sample in window {
            let s = f64::from(sample);
            sum += s * s;
        }

        let mut rms = (sum / window.len() as f64).sqrt();
        if !rms.is_finite() {
            rms = 0.0;
        }

        if rms > 0.0 {
            let db = 20.0 * rms.log10();
            if db.is_finite() {
                db
            } else {
                self.floor_db
            }
        } else {
            self.floor_db
        }
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_scale_square_is_zero_db() {
        let meter = LevelMeter::new();
        let window = vec![1.0_f32; 2048];
        assert!(meter.measure(&window).abs() < 0.001);
    }

    #[test]
    fn test_half_scale_is_minus_six_db() {
        let meter = LevelMeter::new();
        let window = vec![0.5_f32; 2048];
        let db = meter.measure(&window);
        assert!((db - (-6.0206)).abs() < 0.01);
    }

    #[test]
    fn test_sine_rms() {
        let meter = LevelMeter::new();
        // Full-scale sine has RMS 1/sqrt(2) = -3.01 dB
        let window: Vec<f32> = (0..4096)
            .map(|i| (2.0 * std::f32::consts::PI * i as f32 / 64.0).sin())
            .collect();
        let db = meter.measure(&window);
        assert!((db - (-3.01)).abs() < 0.05);
    }

    #[test]
    fn test_silence_hits_floor() {
        let meter = LevelMeter::new();
        let window = vec![0.0_f32; 2048];
        assert!((meter.measure(&window) - DEFAULT_FLOOR_DB).abs() < 0.001);
    }

    #[test]
    fn test_empty_window_hits_floor() {
        let meter = LevelMeter::new();
        assert!((meter.measure(&[]) - DEFAULT_FLOOR_DB).abs() < 0.001);
    }

    #[test]
    fn test_nan_input_recovers_to_floor() {
        let meter = LevelMeter::new();
        let window = vec![f32::NAN; 64];
        assert!((meter.measure(&window) - DEFAULT_FLOOR_DB).abs() < 0.001);
    }

    #[test]
    fn test_infinite_input_recovers_to_floor() {
        let meter = LevelMeter::new();
        let window = vec![f32::INFINITY; 64];
        assert!((meter.measure(&window) - DEFAULT_FLOOR_DB).abs() < 0.001);
    }

    #[test]
    fn test_custom_floor() {
        let meter = LevelMeter::with_floor_db(-90.0);
        let window = vec![0.0_f32; 64];
        assert!((meter.measure(&window) - (-90.0)).abs() < 0.001);
    }

    #[test]
    fn test_negative_samples_measure_same_as_positive() {
        let meter = LevelMeter::new();
        let pos = vec![0.3_f32; 512];
        let neg = vec![-0.3_f32; 512];
        assert!((meter.measure(&pos) - meter.measure(&neg)).abs() < 1e-9);
    }
}
