//! Hook for items driven by an external frame loop.

use crate::tempo::Tempo;

/// Something that follows an externally supplied clock.
///
/// A driver calls `animate` once per frame with the absolute time and the
/// time elapsed since the previous frame, both in milliseconds.
pub trait Animate {
    fn animate(&mut self, time: f64, frame_time: f64);
}

impl Animate for Tempo {
    fn animate(&mut self, time: f64, _frame_time: f64) {
        self.track(time);
    }
}

impl<T: Animate + ?Sized> Animate for Box<T> {
    fn animate(&mut self, time: f64, frame_time: f64) {
        (**self).animate(time, frame_time);
    }
}
