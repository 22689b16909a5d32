//! Normalized job record structs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{Keyed, Labeled};

/// Lifecycle states reported by the remote job tracker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Success,
    Failure,
    Aborted,
    Error,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Aborted => "aborted",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single build/test job as reported by the tracker.
///
/// Immutable once fetched; each resync replaces cached records wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Unique identity, used as the cache key.
    pub id: String,
    /// Job name, e.g. `pull-unit-tests`.
    pub name: String,
    #[serde(default)]
    pub build_id: String,
    pub state: JobState,
    pub started_at: DateTime<Utc>,
    /// Where the job's artifacts live.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Envelope returned by the tracker's jobs endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub items: Vec<Job>,
}

impl Keyed for Job {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Labeled for Job {
    /// `state`, `job` and `build` are virtual attributes; everything else
    /// resolves through the labels map.
    fn label(&self, key: &str) -> Option<&str> {
        match key {
            "state" => Some(self.state.as_str()),
            "job" => Some(&self.name),
            "build" => Some(&self.build_id),
            _ => self.labels.get(key).map(String::as_str),
        }
    }
}
