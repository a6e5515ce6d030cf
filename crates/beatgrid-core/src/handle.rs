//! Deferred registry mutations.
//!
//! Callbacks run while their [`Tempo`](crate::Tempo) is mutably borrowed by
//! `track`, so they cannot touch it directly. A [`TempoHandle`] queues
//! requests instead; the tempo applies them before evaluating each listener
//! and once more at the end of the pass.

use crossbeam_channel::Sender;

use crate::error::Result;
use crate::listener::Listener;
use crate::registry::AutoIds;
use crate::rhythm::IntoRhythm;
use crate::tempo::{validate_bpm, Every};

/// Requests queued by a [`TempoHandle`].
pub(crate) enum TempoMessage {
    /// Insert or overwrite a listener.
    Register(Listener),
    /// Remove a listener by name.
    Stop(String),
    /// Remove every listener.
    Clear,
    /// Change the tempo (already validated).
    SetBpm(f64),
}

/// Cloneable handle that queues changes to a [`Tempo`](crate::Tempo).
///
/// Obtained from [`Tempo::handle`](crate::Tempo::handle). Handles share the
/// tempo's name counter, so a name returned by `every(..).start(..)` is final
/// even though the listener is inserted later.
#[derive(Clone, Debug)]
pub struct TempoHandle {
    tx: Sender<TempoMessage>,
    ids: AutoIds,
}

impl TempoHandle {
    pub(crate) fn new(tx: Sender<TempoMessage>, ids: AutoIds) -> Self {
        Self { tx, ids }
    }

    pub(crate) fn ids(&self) -> &AutoIds {
        &self.ids
    }

    /// Queue a registration; see [`Tempo::every`](crate::Tempo::every).
    pub fn every(&self, rhythm: impl IntoRhythm) -> Result<Every<'_>> {
        Ok(Every::for_handle(self, rhythm.into_rhythm()?))
    }

    /// Queue removal of the listener called `name`.
    pub fn stop(&self, name: impl Into<String>) {
        self.send(TempoMessage::Stop(name.into()));
    }

    /// Queue removal of every listener.
    pub fn clear(&self) {
        self.send(TempoMessage::Clear);
    }

    /// Queue a tempo change. Invalid values are rejected here, not later.
    pub fn set_bpm(&self, bpm: f64) -> Result<()> {
        let bpm = validate_bpm(bpm)?;
        self.send(TempoMessage::SetBpm(bpm));
        Ok(())
    }

    pub(crate) fn send(&self, message: TempoMessage) {
        if self.tx.send(message).is_err() {
            log::debug!("[TEMPO] Dropping request: tempo no longer exists");
        }
    }
}
