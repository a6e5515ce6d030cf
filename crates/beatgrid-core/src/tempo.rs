//! The beat-driven callback scheduler.
//!
//! A [`Tempo`] holds a beat rate and a registry of listeners. An external
//! loop calls [`Tempo::track`] with the current time in milliseconds; each
//! listener fires when its local time crosses the end of its current period.
//!
//! ```
//! use beatgrid_core::Tempo;
//!
//! let mut tempo = Tempo::new(60.0).unwrap();
//! let name = tempo.every(4.0).unwrap().start(|count| println!("bar {count}"));
//!
//! tempo.track(0.0); // bar 0
//! tempo.track(4000.0); // bar 1
//! tempo.stop(&name);
//! ```

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::{Result, TempoError};
use crate::handle::{TempoHandle, TempoMessage};
use crate::listener::{Completion, Listener, ListenerInfo, Response};
use crate::registry::{AutoIds, Registry};
use crate::rhythm::{IntoRhythm, Rhythm};

/// Milliseconds in one minute.
pub const MS_PER_MINUTE: f64 = 60_000.0;

pub(crate) fn validate_bpm(bpm: f64) -> Result<f64> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(bpm)
    } else {
        Err(TempoError::InvalidBpm(bpm))
    }
}

fn validate_ms_per_beat(ms: f64) -> Result<f64> {
    if ms.is_finite() && ms > 0.0 {
        Ok(ms)
    } else {
        Err(TempoError::InvalidMsPerBeat(ms))
    }
}

/// Beat rate plus the listeners that follow it.
#[derive(Debug)]
pub struct Tempo {
    bpm: f64,
    ms_per_beat: f64,
    registry: Registry,
    ids: AutoIds,
    tx: Sender<TempoMessage>,
    rx: Receiver<TempoMessage>,
}

impl Tempo {
    /// Create a tempo from beats per minute.
    pub fn new(bpm: f64) -> Result<Self> {
        let bpm = validate_bpm(bpm)?;
        let (tx, rx) = unbounded();
        Ok(Self {
            bpm,
            ms_per_beat: MS_PER_MINUTE / bpm,
            registry: Registry::new(),
            ids: AutoIds::default(),
            tx,
            rx,
        })
    }

    /// Create a tempo from milliseconds per beat.
    ///
    /// The resulting BPM is `60000 / ms` exactly. This differs from
    /// [`set_ms_per_beat`](Self::set_ms_per_beat), which truncates the BPM.
    pub fn from_beat(ms: f64) -> Result<Self> {
        let ms = validate_ms_per_beat(ms)?;
        Self::new(MS_PER_MINUTE / ms)
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Milliseconds per beat, derived from the BPM.
    pub fn ms_per_beat(&self) -> f64 {
        self.ms_per_beat
    }

    /// Set beats per minute. Every listener rescales on its next evaluation.
    pub fn set_bpm(&mut self, bpm: f64) -> Result<()> {
        let bpm = validate_bpm(bpm)?;
        self.flush();
        self.apply_bpm(bpm);
        Ok(())
    }

    /// Set milliseconds per beat.
    ///
    /// The BPM is truncated to a whole number and the stored milliseconds
    /// per beat are recomputed from it, so `500.0` round-trips but `700.0`
    /// becomes `60000 / 85`.
    pub fn set_ms_per_beat(&mut self, ms: f64) -> Result<()> {
        let ms = validate_ms_per_beat(ms)?;
        let bpm = (MS_PER_MINUTE / ms).floor();
        if bpm < 1.0 {
            return Err(TempoError::InvalidMsPerBeat(ms));
        }
        self.flush();
        self.apply_bpm(bpm);
        Ok(())
    }

    fn apply_bpm(&mut self, bpm: f64) {
        log::debug!("[TEMPO] BPM {} -> {}", self.bpm, bpm);
        self.bpm = bpm;
        self.ms_per_beat = MS_PER_MINUTE / bpm;
    }

    /// Start a registration on `rhythm`: a beat period or a sequence of them.
    ///
    /// ```
    /// # use beatgrid_core::Tempo;
    /// let mut tempo = Tempo::new(120.0).unwrap();
    /// tempo.every([2.0, 4.0]).unwrap()
    ///     .offset(-250.0)
    ///     .named("pulse")
    ///     .progress(|count, progress, _time, started| {
    ///         if started {
    ///             println!("cycle {count}");
    ///         }
    ///         progress >= 1.0
    ///     });
    /// ```
    pub fn every(&mut self, rhythm: impl IntoRhythm) -> Result<Every<'_>> {
        let rhythm = rhythm.into_rhythm()?;
        Ok(Every::for_tempo(self, rhythm))
    }

    /// Remove the listener called `name`. Unknown names are ignored.
    pub fn stop(&mut self, name: &str) {
        self.flush();
        self.remove(name);
    }

    /// Remove every listener.
    pub fn clear(&mut self) {
        self.flush();
        self.registry.clear();
    }

    /// A handle callbacks can capture to change this tempo mid-pass.
    pub fn handle(&self) -> TempoHandle {
        TempoHandle::new(self.tx.clone(), self.ids.clone())
    }

    /// Evaluate every listener at absolute `time` (milliseconds).
    ///
    /// Listeners are visited in registration order over a snapshot of names
    /// taken at the start of the pass: one removed before its turn is
    /// skipped, one added during the pass waits for the next call. A panic
    /// in a callback propagates and ends the pass. Non-finite times are
    /// ignored.
    pub fn track(&mut self, time: f64) {
        if !time.is_finite() {
            log::warn!("[TEMPO] Ignoring non-finite time {}", time);
            return;
        }
        self.flush();
        for name in self.registry.names() {
            self.flush();
            let ms_per_beat = self.ms_per_beat;
            let Some(listener) = self.registry.get_mut(&name) else {
                continue;
            };
            if listener.evaluate(time, ms_per_beat) {
                log::debug!("[TEMPO] Listener '{}' finished", name);
                self.registry.remove(&name);
            }
        }
        self.flush();
    }

    /// Apply every request queued through a [`TempoHandle`].
    ///
    /// Runs automatically inside `track` and before direct mutations.
    pub fn flush(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                TempoMessage::Register(listener) => self.insert_now(listener),
                TempoMessage::Stop(name) => self.remove(&name),
                TempoMessage::Clear => self.registry.clear(),
                TempoMessage::SetBpm(bpm) => self.apply_bpm(bpm),
            }
        }
    }

    fn insert(&mut self, listener: Listener) {
        self.flush();
        self.insert_now(listener);
    }

    fn insert_now(&mut self, listener: Listener) {
        let name = listener.name().to_string();
        let kind = listener.kind();
        if self.registry.insert(listener).is_some() {
            log::debug!("[TEMPO] Replaced listener '{}' ({:?})", name, kind);
        } else {
            log::debug!("[TEMPO] Registered listener '{}' ({:?})", name, kind);
        }
    }

    fn remove(&mut self, name: &str) {
        if self.registry.remove(name).is_some() {
            log::debug!("[TEMPO] Stopped listener '{}'", name);
        }
    }

    /// Snapshot of the listener called `name`.
    ///
    /// Like the other inspection methods, this only sees registrations a
    /// [`TempoHandle`] queued once they have been applied by [`flush`](Self::flush)
    /// or [`track`](Self::track).
    pub fn listener(&self, name: &str) -> Option<ListenerInfo> {
        self.registry.get(name).map(Listener::info)
    }

    /// Listener names in evaluation order.
    pub fn listener_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Whether `name` is registered. Queued handle requests are not counted.
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Number of registered listeners, excluding queued handle requests.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }
}

enum Target<'a> {
    Tempo(&'a mut Tempo),
    Handle(&'a TempoHandle),
}

/// Registration builder returned by [`Tempo::every`] and [`TempoHandle::every`].
///
/// Finish with [`start`](Self::start) or [`progress`](Self::progress); both
/// return the listener's name for a later [`Tempo::stop`].
pub struct Every<'a> {
    target: Target<'a>,
    rhythm: Rhythm,
    offset_ms: f64,
    name: Option<String>,
}

impl<'a> Every<'a> {
    fn for_tempo(tempo: &'a mut Tempo, rhythm: Rhythm) -> Self {
        Self::with_target(Target::Tempo(tempo), rhythm)
    }

    pub(crate) fn for_handle(handle: &'a TempoHandle, rhythm: Rhythm) -> Self {
        Self::with_target(Target::Handle(handle), rhythm)
    }

    fn with_target(target: Target<'a>, rhythm: Rhythm) -> Self {
        Self {
            target,
            rhythm,
            offset_ms: 0.0,
            name: None,
        }
    }

    /// Shift this listener's clock by `ms` (negative runs behind).
    pub fn offset(mut self, ms: f64) -> Self {
        if ms.is_finite() {
            self.offset_ms = ms;
        } else {
            log::warn!("[TEMPO] Ignoring non-finite offset {}", ms);
        }
        self
    }

    /// Register under `name`, replacing any listener already using it.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Call `callback(count)` each time a boundary is crossed.
    pub fn start<F, R>(self, mut callback: F) -> String
    where
        F: FnMut(u64) -> R + 'static,
        R: Completion,
    {
        self.register(Response::Start(Box::new(move |count| {
            callback(count).is_done()
        })))
    }

    /// Call `callback(count, progress, time, just_started)` on every tick.
    ///
    /// `progress` runs from 0 to 1 across the current period and `time` is
    /// the listener-local time (offset applied).
    pub fn progress<F, R>(self, mut callback: F) -> String
    where
        F: FnMut(u64, f64, f64, bool) -> R + 'static,
        R: Completion,
    {
        self.register(Response::Progress(Box::new(
            move |count, progress, time, started| callback(count, progress, time, started).is_done(),
        )))
    }

    fn register(self, response: Response) -> String {
        let name = match self.name {
            Some(name) => name,
            None => match &self.target {
                Target::Tempo(tempo) => tempo.ids.next_name(),
                Target::Handle(handle) => handle.ids().next_name(),
            },
        };
        let listener = Listener::new(name.clone(), self.rhythm, self.offset_ms, response);
        match self.target {
            Target::Tempo(tempo) => tempo.insert(listener),
            Target::Handle(handle) => handle.send(TempoMessage::Register(listener)),
        }
        name
    }
}
