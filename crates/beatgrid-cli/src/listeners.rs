//! Logging listeners built from config entries

use std::cell::OnceCell;
use std::rc::Rc;

use beatgrid_core::Tempo;

use crate::config::{ListenerSettings, ListenerType};
use crate::error::Result;

/// Register one logging listener per entry, returning the resolved names.
///
/// Start listeners log each crossing at `info`. Progress listeners log each
/// new period at `info` and every frame at `debug`. An entry with a `limit`
/// unsubscribes itself after that many crossings.
pub fn register_all(tempo: &mut Tempo, settings: &[ListenerSettings]) -> Result<Vec<String>> {
    settings
        .iter()
        .map(|listener| register(tempo, listener))
        .collect()
}

/// Register a single logging listener.
pub fn register(tempo: &mut Tempo, settings: &ListenerSettings) -> Result<String> {
    // The callback learns its registry name once registration has resolved it.
    let label: Rc<OnceCell<String>> = Rc::new(OnceCell::new());
    let limit = settings.limit;
    let mut crossings = 0u64;

    let mut every = tempo.every(settings.beats.clone())?.offset(settings.offset_ms);
    if let Some(name) = &settings.name {
        every = every.named(name.clone());
    }

    let name = match settings.kind {
        ListenerType::Start => {
            let label = label.clone();
            every.start(move |count| {
                crossings += 1;
                log::info!("[{}] beat {}", label_of(&label), count);
                reached(limit, crossings)
            })
        }
        ListenerType::Progress => {
            let label = label.clone();
            every.progress(move |count, progress, time, started| {
                if started {
                    crossings += 1;
                    log::info!("[{}] period {} at {:.0}ms", label_of(&label), count, time);
                }
                log::debug!(
                    "[{}] {} {:>5.1}%",
                    label_of(&label),
                    count,
                    progress * 100.0
                );
                started && reached(limit, crossings)
            })
        }
    };

    let _ = label.set(name.clone());
    log::debug!(
        "Registered {:?} listener '{}' on {:?}",
        settings.kind,
        name,
        settings.beats
    );
    Ok(name)
}

fn label_of(label: &OnceCell<String>) -> &str {
    label.get().map(String::as_str).unwrap_or("?")
}

fn reached(limit: Option<u64>, crossings: u64) -> bool {
    limit.is_some_and(|limit| crossings >= limit)
}
