//! End-to-end scenarios for the list-watch bridge: watch session timing,
//! lister queries over a seeded cache, and a full informer run against a
//! canned loopback tracker.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, bounded};

use jobsync::cache::{Event, ListWatch, Selector, Store, Watch};
use jobsync::informer::{JobInformer, JobLister, JobListWatcher, STATE_INDEX};
use jobsync::model::{Job, JobState};
use jobsync::tracker::TrackerClient;

fn job(id: &str, state: JobState) -> Job {
    Job {
        id: id.to_string(),
        name: id.split('/').next().unwrap_or(id).to_string(),
        build_id: String::new(),
        state,
        started_at: chrono::Utc::now(),
        url: format!("https://artifacts.example.com/{id}"),
        labels: Default::default(),
    }
}

/// A client that never gets dialed; watch sessions need no network.
fn offline_adapter(interval: Duration) -> JobListWatcher {
    let client = TrackerClient::new("http://127.0.0.1:1").unwrap();
    JobListWatcher::new(client, interval)
}

#[test]
fn watch_expires_within_the_configured_window() {
    let adapter = offline_adapter(Duration::from_millis(50));
    let watcher = adapter.watch("").unwrap();
    let events = watcher.events();

    // No event before 40ms.
    assert_eq!(
        events.recv_timeout(Duration::from_millis(40)),
        Err(RecvTimeoutError::Timeout)
    );

    // Exactly one expiry event by 70ms.
    match events.recv_timeout(Duration::from_millis(30)) {
        Ok(Event::Error(error)) => assert!(error.is_expired()),
        other => panic!("expected expiry event, got {other:?}"),
    }

    // Channel closes within 10ms of the event.
    assert_eq!(
        events.recv_timeout(Duration::from_millis(10)),
        Err(RecvTimeoutError::Disconnected)
    );
}

#[test]
fn stopped_watch_emits_nothing_and_closes_promptly() {
    let adapter = offline_adapter(Duration::from_secs(1));
    let watcher = adapter.watch("").unwrap();

    thread::sleep(Duration::from_millis(10));
    let stopped_at = Instant::now();
    watcher.stop();
    assert!(stopped_at.elapsed() < Duration::from_millis(20));

    // Zero events ever arrive; the channel is closed.
    assert_eq!(
        watcher.events().recv_timeout(Duration::from_millis(20)),
        Err(RecvTimeoutError::Disconnected)
    );
}

#[test]
fn seeded_cache_lister_scenario() {
    let store = Arc::new(
        Store::new().with_index(STATE_INDEX, |job: &Job| vec![job.state.to_string()]),
    );
    store.replace(vec![job("a", JobState::Failure), job("b", JobState::Success)]);
    let lister = JobLister::new(Arc::clone(&store));

    let failures = lister.list(&Selector::parse("state=failure").unwrap());
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, "a");

    let success = lister.get("b").unwrap();
    assert_eq!(success.state, JobState::Success);

    let err = lister.get("c").unwrap_err();
    assert_eq!(err.id(), "c");
    assert!(err.to_string().contains("not found"));

    // The state index serves the same query without a scan.
    assert_eq!(store.by_index(STATE_INDEX, "failure").len(), 1);
}

/// Loopback tracker that serves the same snapshot for every request and
/// counts how many times it was listed.
fn serve_snapshot(body: &'static str) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            counter.fetch_add(1, Ordering::SeqCst);
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    (format!("http://{addr}"), hits)
}

#[test]
fn informer_populates_cache_and_relists_after_expiry() {
    let body = r#"{
        "items": [
            {"id": "a", "name": "a", "state": "failure", "started_at": "2026-08-01T10:00:00Z"},
            {"id": "b", "name": "b", "state": "success", "started_at": "2026-08-01T11:00:00Z"}
        ]
    }"#;
    let (base, hits) = serve_snapshot(body);

    let client = TrackerClient::with_timeout(base, Duration::from_secs(5)).unwrap();
    let informer = Arc::new(JobInformer::new(
        client,
        Duration::from_millis(50),
        Duration::from_secs(10),
    ));
    let lister = informer.lister();

    let (stop_tx, stop_rx) = bounded(1);
    let runner = Arc::clone(&informer);
    let handle = thread::spawn(move || runner.run(&stop_rx));

    // Cache fills from the first list.
    wait_until(|| informer.store().len() == 2);
    assert_eq!(lister.get("a").unwrap().state, JobState::Failure);

    // Each watch expiry forces another full list.
    wait_until(|| hits.load(Ordering::SeqCst) >= 3);

    stop_tx.send(()).unwrap();
    handle.join().expect("informer thread");
    assert_eq!(informer.store().len(), 2);
}

#[test]
fn informer_survives_tracker_outage() {
    // Nothing listening: every list fails and the reflector backs off.
    let client = TrackerClient::with_timeout("http://127.0.0.1:1", Duration::from_millis(200))
        .unwrap();
    let informer = Arc::new(JobInformer::new(
        client,
        Duration::from_millis(50),
        Duration::from_secs(10),
    ));

    let (stop_tx, stop_rx) = bounded(1);
    let runner = Arc::clone(&informer);
    let handle = thread::spawn(move || runner.run(&stop_rx));

    thread::sleep(Duration::from_millis(100));
    assert!(informer.store().is_empty());

    stop_tx.send(()).unwrap();
    handle.join().expect("informer thread exits on stop");
}

fn wait_until(predicate: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !predicate() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}
