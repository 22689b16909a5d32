pub mod cache;
pub mod config;
pub mod informer;
pub mod model;
pub mod tracker;

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use crossbeam_channel::bounded;
use tracing::info;

use crate::cache::Selector;
use crate::config::SyncConfig;
use crate::informer::JobInformer;
use crate::tracker::TrackerClient;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "jobsync",
    version,
    about = "Job metadata synchronization for CI build-log search"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the job informer until interrupted
    Run {
        /// Base URL of the remote job tracker
        #[arg(long, env = "JOBSYNC_TRACKER_URL")]
        tracker_url: Option<String>,

        /// Maximum duration of one watch session, in seconds
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Upper bound on time between full relists, in seconds
        #[arg(long)]
        resync_secs: Option<u64>,

        /// Fetch one snapshot, log it, and exit (headless-friendly)
        #[arg(long, default_value_t = false)]
        once: bool,
    },
    /// Fetch the current snapshot and print matching jobs
    List {
        /// Base URL of the remote job tracker
        #[arg(long, env = "JOBSYNC_TRACKER_URL")]
        tracker_url: Option<String>,

        /// Attribute selector, e.g. "state=failure,job!=flaky"
        #[arg(long, default_value = "")]
        selector: String,

        /// Print one JSON object per line instead of columns
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            tracker_url,
            interval_secs,
            resync_secs,
            once,
        } => {
            let mut config = SyncConfig::from_env();
            if let Some(url) = tracker_url {
                config.tracker_url = url;
            }
            if let Some(secs) = interval_secs {
                config.interval = std::time::Duration::from_secs(secs);
            }
            if let Some(secs) = resync_secs {
                config.resync = std::time::Duration::from_secs(secs);
            }
            run_sync(config, once)
        }
        Commands::List {
            tracker_url,
            selector,
            json,
        } => {
            let mut config = SyncConfig::from_env();
            if let Some(url) = tracker_url {
                config.tracker_url = url;
            }
            run_list(config, &selector, json)
        }
    }
}

fn run_sync(config: SyncConfig, once: bool) -> Result<()> {
    ensure!(
        !config.tracker_url.is_empty(),
        "tracker url is required (--tracker-url or JOBSYNC_TRACKER_URL)"
    );
    let client = TrackerClient::with_timeout(&config.tracker_url, config.request_timeout)?;

    if once {
        let jobs = client.list_jobs().context("fetching job snapshot")?;
        info!(jobs = jobs.len(), "snapshot fetched");
        return Ok(());
    }

    let informer = JobInformer::new(client, config.interval, config.resync);

    let (stop_tx, stop_rx) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("installing signal handler")?;

    info!(
        tracker = %config.tracker_url,
        interval_secs = config.interval.as_secs(),
        resync_secs = config.resync.as_secs(),
        "starting job informer"
    );
    informer.run(&stop_rx);
    info!(jobs = informer.store().len(), "informer stopped");
    Ok(())
}

fn run_list(config: SyncConfig, selector: &str, json: bool) -> Result<()> {
    ensure!(
        !config.tracker_url.is_empty(),
        "tracker url is required (--tracker-url or JOBSYNC_TRACKER_URL)"
    );
    let selector: Selector = selector.parse().context("parsing selector")?;
    let client = TrackerClient::with_timeout(&config.tracker_url, config.request_timeout)?;
    let jobs = client.list_jobs().context("fetching job snapshot")?;

    for job in jobs.iter().filter(|job| selector.matches(*job)) {
        if json {
            println!("{}", serde_json::to_string(job)?);
        } else {
            println!(
                "{}\t{}\t{}\t{}",
                job.id,
                job.state,
                job.started_at.to_rfc3339(),
                job.url
            );
        }
    }
    Ok(())
}
