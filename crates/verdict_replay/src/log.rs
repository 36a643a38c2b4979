//! Arrival-order event recording.

use std::sync::{Arc, Mutex, PoisonError};

use verdict_events::{Event, Listener, dispatch};

/// Listener recording every event in arrival order.
///
/// Clones share the same log, so one handle can sit on the bus while
/// another inspects or replays the recording.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded stream
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-dispatch the recorded stream, in arrival order.
    ///
    /// For a run executed on a single thread this is identical to the
    /// live stream.
    pub fn replay_raw(&self, listener: &mut dyn Listener) {
        for event in self.events() {
            dispatch(listener, &event);
        }
    }
}

impl Listener for EventLog {
    fn on_event(&mut self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog").field("len", &self.len()).finish()
    }
}
