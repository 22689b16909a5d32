//! Timer-bounded pseudo-watch session.
//!
//! The remote tracker cannot push incremental events, so a watch is a slot
//! held open for at most a fixed interval. On expiry the session emits a
//! single error event telling the consumer to relist; on explicit stop it
//! emits nothing. Either way the event channel closes exactly once.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, after, bounded, select};
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{Event, EventError, Watch};

/// The session sends at most one event; the slack keeps that send
/// non-blocking even when the consumer has already walked away.
const EVENT_BUFFER: usize = 100;

/// A single-use watch session bounded by a maximum interval.
///
/// The background thread owns the only event sender, so the channel is
/// closed on every exit path. Dropping the session without calling
/// [`Watch::stop`] also releases the stop trigger and lets the thread
/// finish, but does not drain pending events.
#[derive(Debug)]
pub struct PeriodicWatcher<T> {
    events: Receiver<Event<T>>,
    stop: Mutex<Option<Sender<()>>>,
}

impl<T: Send + 'static> PeriodicWatcher<T> {
    /// Start the session. Spawns exactly one background thread which
    /// terminates within `interval` no matter what the owner does.
    pub fn start(interval: Duration) -> Self {
        let (event_tx, event_rx) = bounded(EVENT_BUFFER);
        let (stop_tx, stop_rx) = bounded::<()>(0);
        thread::spawn(move || run(interval, event_tx, stop_rx));
        Self {
            events: event_rx,
            stop: Mutex::new(Some(stop_tx)),
        }
    }
}

impl<T> PeriodicWatcher<T> {
    /// Release the stop trigger exactly once; the closed-flag semantics
    /// live in the `Option`, so a second call finds it already taken.
    fn signal_stop(&self) {
        if let Some(trigger) = self.stop.lock().take() {
            debug!("stopping watch");
            drop(trigger);
        }
    }
}

impl<T: Send + std::fmt::Debug> Watch<T> for PeriodicWatcher<T> {
    fn events(&self) -> &Receiver<Event<T>> {
        &self.events
    }

    fn stop(&self) {
        self.signal_stop();
        // Drain until the background thread closes the channel so a
        // pending send can never race the teardown.
        for _ in self.events.iter() {}
        debug!("stopped watch");
    }
}

fn run<T>(interval: Duration, events: Sender<Event<T>>, stop: Receiver<()>) {
    // never watch longer than the configured interval
    let expired = after(interval);
    select! {
        recv(expired) -> _ => {
            debug!(?interval, "maximum watch duration reached");
            let _ = events.send(Event::Error(EventError::Expired { interval }));
        }
        recv(stop) -> _ => {}
    }
    debug!("watcher exited");
    // `events` drops here, closing the channel
}
