//! Listener records and the per-tick boundary evaluation.
//!
//! A listener's whole state is `(last_boundary_ms, active_period,
//! cycle_index)`; it only changes when the listener-local time crosses the
//! end of the current period.

use std::fmt;
use std::ops::ControlFlow;

use crate::math::clamp;
use crate::rhythm::Rhythm;

/// Boundary value before a listener has crossed its first boundary.
pub const NO_BOUNDARY_MS: f64 = -1.0;

/// What a callback hands back to say whether it wants to keep listening.
///
/// `()` never unsubscribes, `true` unsubscribes, and
/// [`ControlFlow::Break`] unsubscribes.
pub trait Completion {
    fn is_done(self) -> bool;
}

impl Completion for () {
    fn is_done(self) -> bool {
        false
    }
}

impl Completion for bool {
    fn is_done(self) -> bool {
        self
    }
}

impl<B> Completion for ControlFlow<B> {
    fn is_done(self) -> bool {
        self.is_break()
    }
}

/// Callback fired once per boundary crossing with the period count.
pub type StartFn = Box<dyn FnMut(u64) -> bool>;

/// Callback fired every tick with `(count, progress, time, just_started)`.
pub type ProgressFn = Box<dyn FnMut(u64, f64, f64, bool) -> bool>;

/// The two listener kinds, each carrying its fixed-arity callback.
pub enum Response {
    Start(StartFn),
    Progress(ProgressFn),
}

impl Response {
    pub fn kind(&self) -> ListenerKind {
        match self {
            Response::Start(_) => ListenerKind::Start,
            Response::Progress(_) => ListenerKind::Progress,
        }
    }
}

/// Discriminant of [`Response`], for inspection without the callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerKind {
    /// Fires on boundary crossings only.
    Start,
    /// Fires on every tick with fractional progress.
    Progress,
}

/// One registered callback and its position on the beat grid.
pub struct Listener {
    name: String,
    rhythm: Rhythm,
    active_period: f64,
    cycle_index: usize,
    offset_ms: f64,
    last_boundary_ms: Option<f64>,
    response: Response,
}

impl Listener {
    pub(crate) fn new(name: String, rhythm: Rhythm, offset_ms: f64, response: Response) -> Self {
        Self {
            name,
            active_period: rhythm.first(),
            rhythm,
            cycle_index: 0,
            offset_ms,
            last_boundary_ms: None,
            response,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ListenerKind {
        self.response.kind()
    }

    /// Read-only snapshot of this listener's state.
    pub fn info(&self) -> ListenerInfo {
        ListenerInfo {
            name: self.name.clone(),
            kind: self.kind(),
            rhythm: self.rhythm.clone(),
            active_period: self.active_period,
            cycle_index: self.cycle_index,
            offset_ms: self.offset_ms,
            last_boundary_ms: self.last_boundary_ms,
        }
    }

    /// Evaluate this listener at absolute `time` and invoke its callback.
    ///
    /// Returns `true` when the callback asked to be unsubscribed.
    pub(crate) fn evaluate(&mut self, time: f64, ms_per_beat: f64) -> bool {
        let t = time + self.offset_ms;
        let period_ms = self.active_period * ms_per_beat;

        let crossed = match self.last_boundary_ms {
            None => t > NO_BOUNDARY_MS,
            Some(boundary) => t >= boundary + period_ms,
        };

        if crossed {
            // Snap to the beat grid at or before t.
            let boundary = t - t.rem_euclid(ms_per_beat);
            self.last_boundary_ms = Some(boundary);
            if self.rhythm.is_cycle() {
                self.cycle_index = (self.cycle_index + 1) % self.rhythm.len();
                self.active_period = self.rhythm.period_at(self.cycle_index);
            }
            log::trace!(
                "[TEMPO] '{}' crossed at {:.1}ms (grid {:.1}ms, next period {} beats)",
                self.name,
                t,
                boundary,
                self.active_period
            );
        }

        let boundary = self.last_boundary_ms.unwrap_or(NO_BOUNDARY_MS);
        let count = self.count(boundary, ms_per_beat);

        match &mut self.response {
            Response::Start(f) => crossed && f(count),
            Response::Progress(f) => {
                let progress = if period_ms > 0.0 {
                    clamp((t - boundary) / period_ms, 0.0, 1.0)
                } else {
                    1.0
                };
                f(count, progress, t, crossed)
            }
        }
    }

    /// Whole periods elapsed on the beat grid up to `boundary`.
    fn count(&self, boundary: f64, ms_per_beat: f64) -> u64 {
        let beats = (boundary / ms_per_beat).floor();
        let periods = if self.active_period > 0.0 {
            (beats / self.active_period).ceil()
        } else {
            beats
        };
        periods.max(0.0) as u64
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("rhythm", &self.rhythm)
            .field("active_period", &self.active_period)
            .field("cycle_index", &self.cycle_index)
            .field("offset_ms", &self.offset_ms)
            .field("last_boundary_ms", &self.last_boundary_ms)
            .finish_non_exhaustive()
    }
}

/// Snapshot of a listener, returned by [`crate::Tempo::listener`].
#[derive(Clone, Debug, PartialEq)]
pub struct ListenerInfo {
    pub name: String,
    pub kind: ListenerKind,
    pub rhythm: Rhythm,
    /// Period, in beats, until the next crossing.
    pub active_period: f64,
    /// Position in the rhythm's cycle (0 for fixed periods).
    pub cycle_index: usize,
    pub offset_ms: f64,
    /// Grid-aligned time of the last crossing; `None` before the first one.
    pub last_boundary_ms: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_start(rhythm: Rhythm, offset_ms: f64) -> (Listener, Rc<RefCell<Vec<u64>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        let listener = Listener::new(
            "test".to_string(),
            rhythm,
            offset_ms,
            Response::Start(Box::new(move |count| {
                sink.borrow_mut().push(count);
                false
            })),
        );
        (listener, calls)
    }

    #[test]
    fn test_completion_values() {
        assert!(!().is_done());
        assert!(true.is_done());
        assert!(!false.is_done());
        assert!(ControlFlow::<()>::Break(()).is_done());
        assert!(!ControlFlow::<()>::Continue(()).is_done());
    }

    #[test]
    fn test_first_evaluation_crosses() {
        let (mut listener, calls) = recording_start(Rhythm::Every(4.0), 0.0);
        assert!(!listener.evaluate(0.0, 1000.0));
        assert_eq!(*calls.borrow(), vec![0]);
        assert_eq!(listener.info().last_boundary_ms, Some(0.0));
    }

    #[test]
    fn test_boundary_snaps_to_beat_grid() {
        let (mut listener, _calls) = recording_start(Rhythm::Every(2.0), 0.0);
        listener.evaluate(1250.0, 1000.0);
        assert_eq!(listener.info().last_boundary_ms, Some(1000.0));
        listener.evaluate(3100.0, 1000.0);
        assert_eq!(listener.info().last_boundary_ms, Some(3000.0));
    }

    #[test]
    fn test_negative_offset_defers_first_crossing() {
        let (mut listener, calls) = recording_start(Rhythm::Every(1.0), -500.0);
        listener.evaluate(0.0, 1000.0);
        listener.evaluate(499.0, 1000.0);
        assert!(calls.borrow().is_empty());
        assert_eq!(listener.info().last_boundary_ms, None);

        listener.evaluate(500.0, 1000.0);
        assert_eq!(*calls.borrow(), vec![0]);
    }

    #[test]
    fn test_positive_offset_runs_ahead() {
        let (mut listener, calls) = recording_start(Rhythm::Every(1.0), 2000.0);
        listener.evaluate(0.0, 1000.0);
        // Local time is 2000ms: two whole beats in.
        assert_eq!(*calls.borrow(), vec![2]);
    }

    #[test]
    fn test_progress_values() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut listener = Listener::new(
            "p".to_string(),
            Rhythm::Every(2.0),
            0.0,
            Response::Progress(Box::new(move |count, progress, time, started| {
                sink.borrow_mut().push((count, progress, time, started));
                false
            })),
        );

        listener.evaluate(0.0, 500.0);
        listener.evaluate(250.0, 500.0);
        listener.evaluate(1000.0, 500.0);

        let seen = seen.borrow();
        assert_eq!(seen[0], (0, 0.0, 0.0, true));
        assert_eq!(seen[1].0, 0);
        assert!((seen[1].1 - 0.25).abs() < 1e-9);
        assert!(!seen[1].3);
        assert_eq!(seen[2], (1, 0.0, 1000.0, true));
    }

    #[test]
    fn test_zero_period_fires_every_tick() {
        let (mut listener, calls) = recording_start(Rhythm::Every(0.0), 0.0);
        listener.evaluate(0.0, 1000.0);
        listener.evaluate(10.0, 1000.0);
        listener.evaluate(2500.0, 1000.0);
        assert_eq!(*calls.borrow(), vec![0, 0, 2]);
    }

    #[test]
    fn test_done_is_reported() {
        let mut listener = Listener::new(
            "once".to_string(),
            Rhythm::Every(1.0),
            0.0,
            Response::Start(Box::new(|_| true)),
        );
        assert!(listener.evaluate(0.0, 1000.0));
    }

    #[test]
    fn test_start_listener_silent_between_crossings() {
        let mut listener = Listener::new(
            "quiet".to_string(),
            Rhythm::Every(1.0),
            0.0,
            Response::Start(Box::new(|_| true)),
        );
        assert!(listener.evaluate(0.0, 1000.0));
        // Not crossed again: callback is not invoked, so it cannot ask to stop.
        assert!(!listener.evaluate(10.0, 1000.0));
    }
}
