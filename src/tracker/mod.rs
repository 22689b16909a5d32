//! HTTP client for the remote job tracker.
//!
//! One operation: fetch the full current job collection. The tracker has no
//! incremental or paged variant; retry policy belongs to the caller.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;
use tracing::debug;

use crate::model::{Job, JobList};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure fetching or decoding the tracker's job snapshot.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("building http client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("fetching jobs from {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("tracker returned {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("decoding job list from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Client for the tracker's snapshot API.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    base: String,
    http: Client,
}

impl TrackerClient {
    pub fn new(base: impl Into<String>) -> Result<Self, TrackerError> {
        Self::with_timeout(base, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base: impl Into<String>, timeout: Duration) -> Result<Self, TrackerError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jobsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TrackerError::Build)?;
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Ok(Self { base, http })
    }

    /// Fetch all jobs currently known to the tracker.
    pub fn list_jobs(&self) -> Result<Vec<Job>, TrackerError> {
        let url = format!("{}/jobs", self.base);
        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|source| TrackerError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::Status { status, url });
        }

        let body = response.text().map_err(|source| TrackerError::Http {
            url: url.clone(),
            source,
        })?;
        let list: JobList =
            serde_json::from_str(&body).map_err(|source| TrackerError::Decode {
                url: url.clone(),
                source,
            })?;

        debug!(jobs = list.items.len(), url = %url, "fetched job snapshot");
        Ok(list.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let client = TrackerClient::new("https://tracker.example.com//").unwrap();
        assert_eq!(client.base, "https://tracker.example.com");
    }
}
