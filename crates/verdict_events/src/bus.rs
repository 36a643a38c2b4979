//! Event bus: one globally ordered delivery stream.
//!
//! In inline mode events are dispatched on the firing thread, under a lock.
//! In aggregated mode (parallel runs) events are pushed onto a channel and a
//! single aggregator thread owns the listeners; the channel is the only
//! serialization point, so listeners never need their own locking.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Mutex;
use std::sync::mpsc::{self, SyncSender};
use std::thread::JoinHandle;

use crate::event::Event;
use crate::listener::{Listener, dispatch};

// Bound on in-flight events before firing threads block
const CHANNEL_CAPACITY: usize = 1024;

enum Mode {
    Inline {
        listeners: Mutex<Vec<Box<dyn Listener>>>,
    },
    Aggregated {
        sender: SyncSender<Event>,
        handle: Mutex<Option<JoinHandle<Vec<Box<dyn Listener>>>>>,
    },
}

/// Delivers events to listeners in fire order.
pub struct EventBus {
    mode: Mode,
}

impl EventBus {
    /// Bus dispatching inline on the firing thread
    #[must_use]
    pub fn inline(listeners: Vec<Box<dyn Listener>>) -> Self {
        Self {
            mode: Mode::Inline {
                listeners: Mutex::new(listeners),
            },
        }
    }

    /// Bus dispatching from a dedicated aggregator thread
    #[must_use]
    pub fn aggregated(listeners: Vec<Box<dyn Listener>>) -> Self {
        let (sender, receiver) = mpsc::sync_channel::<Event>(CHANNEL_CAPACITY);
        let handle = std::thread::Builder::new()
            .name("verdict-events".to_string())
            .spawn(move || {
                let mut listeners = listeners;
                while let Ok(event) = receiver.recv() {
                    dispatch_protected(&mut listeners, &event);
                }
                listeners
            })
            .expect("failed to spawn event aggregator thread");
        Self {
            mode: Mode::Aggregated {
                sender,
                handle: Mutex::new(Some(handle)),
            },
        }
    }

    /// Deliver an event to every listener.
    ///
    /// Inline mode dispatches before returning; aggregated mode enqueues
    /// and returns, blocking only when the channel is full.
    pub fn fire(&self, event: Event) {
        match &self.mode {
            Mode::Inline { listeners } => {
                let mut listeners = listeners
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                dispatch_protected(&mut listeners, &event);
            }
            Mode::Aggregated { sender, .. } => {
                if sender.send(event).is_err() {
                    tracing::error!("event dropped: aggregator thread is gone");
                }
            }
        }
    }

    /// Drain in-flight events and reclaim the listeners.
    ///
    /// After this call the stream is sealed; the caller inspects the
    /// listeners for whatever they accumulated.
    #[must_use]
    pub fn finish(self) -> Vec<Box<dyn Listener>> {
        match self.mode {
            Mode::Inline { listeners } => listeners
                .into_inner()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
            Mode::Aggregated { sender, handle } => {
                drop(sender);
                let handle = handle
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .take();
                match handle {
                    Some(handle) => match handle.join() {
                        Ok(listeners) => listeners,
                        Err(_) => {
                            tracing::error!("event aggregator thread panicked");
                            Vec::new()
                        }
                    },
                    None => Vec::new(),
                }
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.mode {
            Mode::Inline { .. } => "inline",
            Mode::Aggregated { .. } => "aggregated",
        };
        f.debug_struct("EventBus").field("mode", &mode).finish()
    }
}

// A panicking listener is removed from further dispatch; the rest of the
// run and the other listeners continue.
fn dispatch_protected(listeners: &mut Vec<Box<dyn Listener>>, event: &Event) {
    let mut index = 0;
    while index < listeners.len() {
        let listener = &mut listeners[index];
        let outcome = catch_unwind(AssertUnwindSafe(|| dispatch(listener.as_mut(), event)));
        if outcome.is_err() {
            tracing::error!(?event, "listener panicked, removing it from the run");
            listeners.remove(index);
        } else {
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use verdict_core::Timestamp;

    use super::*;
    use crate::event::EventKind;

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<EventKind>>>,
    }

    impl Listener for Recorder {
        fn on_event(&mut self, event: &Event) {
            self.events.lock().unwrap().push(event.kind.clone());
        }
    }

    struct Panicker;

    impl Listener for Panicker {
        fn on_session_end(&mut self, _time: Timestamp) {
            panic!("listener bug")
        }
    }

    #[test]
    fn test_inline_bus_dispatches_in_order() {
        let recorder = Recorder::default();
        let bus = EventBus::inline(vec![Box::new(recorder.clone())]);

        bus.fire(Event::now(EventKind::SessionStart));
        bus.fire(Event::now(EventKind::SessionEnd));
        let _ = bus.finish();

        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec![EventKind::SessionStart, EventKind::SessionEnd]
        );
    }

    #[test]
    fn test_aggregated_bus_delivers_everything_before_finish() {
        let recorder = Recorder::default();
        let bus = EventBus::aggregated(vec![Box::new(recorder.clone())]);

        for _ in 0..100 {
            bus.fire(Event::now(EventKind::SessionStart));
        }
        bus.fire(Event::now(EventKind::SessionEnd));
        let _ = bus.finish();

        assert_eq!(recorder.events.lock().unwrap().len(), 101);
    }

    #[test]
    fn test_panicking_listener_is_isolated_and_dropped() {
        let recorder = Recorder::default();
        let bus = EventBus::inline(vec![Box::new(Panicker), Box::new(recorder.clone())]);

        bus.fire(Event::now(EventKind::SessionStart));
        bus.fire(Event::now(EventKind::SessionEnd));
        bus.fire(Event::now(EventKind::SessionStart));
        let listeners = bus.finish();

        // the panicker was removed, the recorder saw the full stream
        assert_eq!(listeners.len(), 1);
        assert_eq!(recorder.events.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_aggregated_fire_from_many_threads() {
        let recorder = Recorder::default();
        let bus = Arc::new(EventBus::aggregated(vec![Box::new(recorder.clone())]));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bus = Arc::clone(&bus);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        bus.fire(Event::now(EventKind::SessionStart));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let bus = Arc::try_unwrap(bus).unwrap_or_else(|_| panic!("bus still shared"));
        let _ = bus.finish();

        assert_eq!(recorder.events.lock().unwrap().len(), 200);
    }
}
