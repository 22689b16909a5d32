//! Read-only query facade over the synchronized job cache.

use std::sync::Arc;

use thiserror::Error;

use crate::cache::{Selector, Store};
use crate::model::Job;

const GROUP: &str = "search.ci";
const KIND: &str = "Job";

/// Lookup failure from [`JobLister::get`]: the identity is not in the
/// cache. Carries the resource's group/kind so the condition logs usefully
/// and callers can branch on "does not exist".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{group}/{kind} {id:?} not found")]
pub struct NotFound {
    group: &'static str,
    kind: &'static str,
    id: String,
}

impl NotFound {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Typed read access to cached job records.
///
/// Both operations read the local cache snapshot only; neither blocks on
/// network I/O or on reconciliation timing.
#[derive(Clone)]
pub struct JobLister {
    store: Arc<Store<Job>>,
}

impl JobLister {
    pub fn new(store: Arc<Store<Job>>) -> Self {
        Self { store }
    }

    /// All cached jobs matching `selector`, in indeterminate order.
    pub fn list(&self, selector: &Selector) -> Vec<Arc<Job>> {
        self.store
            .list()
            .into_iter()
            .filter(|job| selector.matches(job.as_ref()))
            .collect()
    }

    /// The cached job with exactly this identity.
    pub fn get(&self, id: &str) -> Result<Arc<Job>, NotFound> {
        self.store.get(id).ok_or_else(|| NotFound {
            group: GROUP,
            kind: KIND,
            id: id.to_string(),
        })
    }
}
