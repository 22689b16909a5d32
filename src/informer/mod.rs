//! List-watch bridge between the remote job tracker and the local cache.
//!
//! The tracker only supports "list everything now", so the watch half of
//! the contract is a timer-bounded session ([`PeriodicWatcher`]) that
//! forces the reflector to relist on a fixed cadence instead of fabricating
//! change events. The reflector's full-list resync is what keeps the cache
//! authoritative; the watch interval only bounds its staleness.
//!
//! - **[`watcher`]**: the bounded pseudo-watch session.
//! - **[`lister`]**: typed read facade over the synchronized cache.

pub mod lister;
pub mod watcher;

pub use lister::{JobLister, NotFound};
pub use watcher::PeriodicWatcher;

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::cache::{self, ListWatch, Reflector, Store, Watch};
use crate::model::Job;
use crate::tracker::TrackerClient;

/// Name of the secondary index mapping lifecycle state to job keys.
pub const STATE_INDEX: &str = "state";

/// Adapts the tracker's one-shot fetch to the [`ListWatch`] contract.
pub struct JobListWatcher {
    client: TrackerClient,
    interval: Duration,
}

impl JobListWatcher {
    /// `interval` bounds every watch session handed out by [`watch`].
    ///
    /// [`watch`]: ListWatch::watch
    pub fn new(client: TrackerClient, interval: Duration) -> Self {
        Self { client, interval }
    }
}

impl ListWatch<Job> for JobListWatcher {
    fn list(&self) -> anyhow::Result<Vec<Job>> {
        Ok(self.client.list_jobs()?)
    }

    fn watch(&self, resource_version: &str) -> anyhow::Result<Box<dyn Watch<Job>>> {
        // fail before any session resources are allocated
        cache::parse_resource_version(resource_version)?;
        Ok(Box::new(PeriodicWatcher::start(self.interval)))
    }
}

/// Shared cache reconciler bound to [`Job`] records.
pub struct JobInformer {
    store: Arc<Store<Job>>,
    reflector: Reflector<Job, JobListWatcher>,
}

impl JobInformer {
    /// `interval` bounds each watch session; `resync` bounds how long the
    /// reflector holds one watch before forcing a relist anyway.
    pub fn new(client: TrackerClient, interval: Duration, resync: Duration) -> Self {
        let store = Arc::new(
            Store::new().with_index(STATE_INDEX, |job: &Job| vec![job.state.to_string()]),
        );
        let list_watch = JobListWatcher::new(client, interval);
        let reflector = Reflector::new(Arc::clone(&store), list_watch, resync);
        Self { store, reflector }
    }

    pub fn store(&self) -> Arc<Store<Job>> {
        Arc::clone(&self.store)
    }

    pub fn lister(&self) -> JobLister {
        JobLister::new(Arc::clone(&self.store))
    }

    /// Drive reconciliation on the calling thread until `stop` fires.
    pub fn run(&self, stop: &Receiver<()>) {
        self.reflector.run(stop);
    }
}
