//! beatgrid-core - Beat-driven callback scheduling.
//!
//! This crate turns a steady beat rate and an externally advancing clock
//! into callbacks on beat-aligned boundaries:
//!
//! - **Tempo** - BPM / milliseconds-per-beat conversion and the listener registry
//! - **Rhythm** - a fixed beat period or a cycling sequence of periods
//! - **Listeners** - start-style (fire on each crossing) and progress-style
//!   (fire every tick with 0..1 progress through the period)
//! - **Handles** - queued registry changes from inside callbacks
//! - **Animate** - the per-frame hook an external loop drives
//!
//! # Architecture
//!
//! Nothing here owns a timer. The caller feeds monotonically non-decreasing
//! timestamps to [`Tempo::track`] (directly or through [`Animate`]) and every
//! listener is evaluated synchronously inside that call.

pub mod animate;
pub mod error;
pub mod handle;
pub mod listener;
pub mod math;
mod registry;
pub mod rhythm;
pub mod tempo;

pub use animate::Animate;
pub use error::{Result, TempoError};
pub use handle::TempoHandle;
pub use listener::{Completion, ListenerInfo, ListenerKind, NO_BOUNDARY_MS};
pub use math::clamp;
pub use registry::AUTO_NAME_PREFIX;
pub use rhythm::{IntoRhythm, Rhythm};
pub use tempo::{Every, Tempo, MS_PER_MINUTE};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixty_bpm_is_one_second_per_beat() {
        let tempo = Tempo::new(60.0).unwrap();
        assert!((tempo.ms_per_beat() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_rhythm_from_array() {
        let rhythm = [2.0, 4.0, 2.0].into_rhythm().unwrap();
        assert_eq!(rhythm.len(), 3);
        assert!(rhythm.is_cycle());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TempoError::InvalidBpm(0.0).to_string(),
            "Invalid BPM: 0 (must be a positive, finite number)"
        );
        assert_eq!(TempoError::EmptyRhythm.to_string(), "Rhythm sequence is empty");
    }
}
