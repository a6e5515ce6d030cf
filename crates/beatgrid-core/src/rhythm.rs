//! Beat periods a listener fires on.
//!
//! A [`Rhythm`] is either a single period measured in beats, or an ordered
//! sequence of periods that a listener walks through, one step per boundary
//! crossing. Periods are in beats rather than milliseconds so that a tempo
//! change rescales every listener at once.

use crate::error::{Result, TempoError};

/// A single beat period or a cycling sequence of them.
#[derive(Clone, Debug, PartialEq)]
pub enum Rhythm {
    /// Fire every `n` beats.
    Every(f64),
    /// Cycle through these periods, advancing on each crossing.
    Cycle(Vec<f64>),
}

impl Rhythm {
    /// A rhythm with one fixed period.
    pub fn new(beats: f64) -> Result<Self> {
        Ok(Rhythm::Every(validate_period(beats)?))
    }

    /// A rhythm that cycles through `beats` in order.
    pub fn sequence(beats: impl Into<Vec<f64>>) -> Result<Self> {
        let beats = beats.into();
        if beats.is_empty() {
            return Err(TempoError::EmptyRhythm);
        }
        for &b in &beats {
            validate_period(b)?;
        }
        Ok(Rhythm::Cycle(beats))
    }

    /// The period a fresh listener starts with.
    pub fn first(&self) -> f64 {
        self.period_at(0)
    }

    /// Period at `index`, wrapping around for sequences.
    pub fn period_at(&self, index: usize) -> f64 {
        match self {
            Rhythm::Every(beats) => *beats,
            Rhythm::Cycle(beats) => beats[index % beats.len()],
        }
    }

    /// Number of steps in the cycle (1 for a fixed period).
    pub fn len(&self) -> usize {
        match self {
            Rhythm::Every(_) => 1,
            Rhythm::Cycle(beats) => beats.len(),
        }
    }

    /// Always false: an empty sequence is rejected on construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether crossings advance through a sequence.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Rhythm::Cycle(_))
    }
}

fn validate_period(beats: f64) -> Result<f64> {
    if beats.is_finite() && beats >= 0.0 {
        Ok(beats)
    } else {
        Err(TempoError::InvalidPeriod(beats))
    }
}

/// Conversion into a validated [`Rhythm`].
///
/// Implemented for plain beat counts and for slices, arrays and vectors of
/// them, so `tempo.every(2.0)` and `tempo.every([2.0, 4.0])` both work.
pub trait IntoRhythm {
    fn into_rhythm(self) -> Result<Rhythm>;
}

impl IntoRhythm for Rhythm {
    fn into_rhythm(self) -> Result<Rhythm> {
        match self {
            Rhythm::Every(beats) => Rhythm::new(beats),
            Rhythm::Cycle(beats) => Rhythm::sequence(beats),
        }
    }
}

impl IntoRhythm for f64 {
    fn into_rhythm(self) -> Result<Rhythm> {
        Rhythm::new(self)
    }
}

impl IntoRhythm for Vec<f64> {
    fn into_rhythm(self) -> Result<Rhythm> {
        Rhythm::sequence(self)
    }
}

impl IntoRhythm for &[f64] {
    fn into_rhythm(self) -> Result<Rhythm> {
        Rhythm::sequence(self.to_vec())
    }
}

impl<const N: usize> IntoRhythm for [f64; N] {
    fn into_rhythm(self) -> Result<Rhythm> {
        Rhythm::sequence(self.to_vec())
    }
}
