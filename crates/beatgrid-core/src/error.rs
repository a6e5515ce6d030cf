//! Error types for the beatgrid-core crate.

use thiserror::Error;

/// Errors raised when a tempo or rhythm would be left in an invalid state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TempoError {
    /// Beats-per-minute must be positive and finite.
    #[error("Invalid BPM: {0} (must be a positive, finite number)")]
    InvalidBpm(f64),

    /// Milliseconds-per-beat must be positive, finite, and map to at least 1 BPM.
    #[error("Invalid milliseconds per beat: {0}")]
    InvalidMsPerBeat(f64),

    /// A period sequence needs at least one element.
    #[error("Rhythm sequence is empty")]
    EmptyRhythm,

    /// A beat period must be finite and not negative.
    #[error("Invalid beat period: {0} (must be a finite number >= 0)")]
    InvalidPeriod(f64),
}

/// Result type alias using TempoError.
pub type Result<T> = std::result::Result<T, TempoError>;
