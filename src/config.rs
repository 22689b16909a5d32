//! Runtime configuration for the sync service.

use std::time::Duration;

/// Configuration for the informer and tracker client.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the remote job tracker.
    pub tracker_url: String,
    /// Maximum duration of one watch session.
    pub interval: Duration,
    /// Upper bound on time between full relists.
    pub resync: Duration,
    /// Timeout for each tracker request.
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tracker_url: String::new(),
            interval: Duration::from_secs(600),
            resync: Duration::from_secs(1800),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SyncConfig {
    /// Load config from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(url) = dotenvy::var("JOBSYNC_TRACKER_URL") {
            cfg.tracker_url = url;
        }

        if let Ok(val) = dotenvy::var("JOBSYNC_INTERVAL_SECS")
            && let Ok(secs) = val.parse()
        {
            cfg.interval = Duration::from_secs(secs);
        }

        if let Ok(val) = dotenvy::var("JOBSYNC_RESYNC_SECS")
            && let Ok(secs) = val.parse()
        {
            cfg.resync = Duration::from_secs(secs);
        }

        if let Ok(val) = dotenvy::var("JOBSYNC_REQUEST_TIMEOUT_SECS")
            && let Ok(secs) = val.parse()
        {
            cfg.request_timeout = Duration::from_secs(secs);
        }

        cfg
    }
}
