//! Error types for the loudness engine

use thiserror::Error;

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors that can occur while driving the loudness controller
///
/// The control loop itself never fails: numerical edge cases (silent or
/// non-finite RMS, zero elapsed time) are recovered locally. The only error
/// this crate reports is a caller contract violation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerError {
    /// A method was called on a controller after `destroy()`
    #[error("loudness controller used after destroy")]
    Destroyed,
}
