//! Reconcile loop: keeps a [`Store`] synchronized through a [`ListWatch`].

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, after, select};
use tracing::{debug, warn};

use super::{Event, Keyed, ListWatch, Store, Watch, resource_version_now};

const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Drives full relists and bounded watch sessions against a store.
///
/// The reflector owns retry policy: list/watch failures are logged and
/// retried after a backoff, never propagated. Expiry events from a watch
/// are not failures, they are the signal to relist.
pub struct Reflector<T, LW> {
    store: Arc<Store<T>>,
    list_watch: LW,
    resync: Duration,
    backoff: Duration,
}

impl<T, LW> Reflector<T, LW>
where
    T: Keyed,
    LW: ListWatch<T>,
{
    pub fn new(store: Arc<Store<T>>, list_watch: LW, resync: Duration) -> Self {
        Self {
            store,
            list_watch,
            resync,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Override the retry backoff applied after list/watch failures.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run the reconcile loop on the calling thread until `stop` fires.
    ///
    /// `stop` fires on a message or on sender disconnect, so dropping the
    /// sending half is enough to shut the loop down.
    pub fn run(&self, stop: &Receiver<()>) {
        loop {
            let items = match self.list_watch.list() {
                Ok(items) => items,
                Err(error) => {
                    warn!(error = %error, "list failed, backing off");
                    if wait_or_stop(stop, self.backoff) {
                        return;
                    }
                    continue;
                }
            };
            debug!(records = items.len(), "replacing cache from full list");
            self.store.replace(items);

            let watcher = match self.list_watch.watch(&resource_version_now()) {
                Ok(watcher) => watcher,
                Err(error) => {
                    warn!(error = %error, "watch failed, backing off");
                    if wait_or_stop(stop, self.backoff) {
                        return;
                    }
                    continue;
                }
            };

            let resync = after(self.resync);
            loop {
                select! {
                    recv(watcher.events()) -> event => match event {
                        Ok(Event::Added(item)) | Ok(Event::Modified(item)) => {
                            self.store.upsert(item);
                        }
                        Ok(Event::Deleted(item)) => {
                            self.store.delete(item.key());
                        }
                        Ok(Event::Error(error)) => {
                            debug!(error = %error, "watch terminated, relisting");
                            watcher.stop();
                            break;
                        }
                        // channel closed: clean stop, relisting is always safe
                        Err(_) => {
                            debug!("watch channel closed, relisting");
                            break;
                        }
                    },
                    recv(resync) -> _ => {
                        debug!("resync interval elapsed, relisting");
                        watcher.stop();
                        break;
                    }
                    recv(stop) -> _ => {
                        watcher.stop();
                        return;
                    }
                }
            }
        }
    }
}

/// Wait out `backoff`, returning true if `stop` fired first.
fn wait_or_stop(stop: &Receiver<()>, backoff: Duration) -> bool {
    select! {
        recv(stop) -> _ => true,
        default(backoff) => false,
    }
}
