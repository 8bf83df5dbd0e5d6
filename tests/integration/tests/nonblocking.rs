//! `send_alert` returns before any network call completes, and bursts of
//! alerts queue on the worker pool without being dropped.

use flareguard_channels::DispatchEngineBuilder;
use flareguard_integration_tests::{frame_files, imgur_success, MockApi, RecordingObserver, JPEG};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn slow_whatsapp(api: &MockApi, delay: Duration) {
    api.mount(
        Mock::given(method("POST"))
            .and(path("/3/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(imgur_success())
                    .set_delay(delay),
            ),
    );
    api.mount(
        Mock::given(method("GET"))
            .and(path("/whatsapp.php"))
            .respond_with(ResponseTemplate::new(200).set_delay(delay)),
    );
}

#[test]
fn test_send_alert_returns_before_delivery() {
    let api = MockApi::start();
    slow_whatsapp(&api, Duration::from_secs(2));

    let dir = tempfile::tempdir().unwrap();
    let config = api
        .configured(dir.path())
        .imgur_client_id("imgur-client")
        .whatsapp("callmebot-key", "+15551234567")
        .build();
    let observer = Arc::new(RecordingObserver::default());
    let engine = DispatchEngineBuilder::from_config(&config)
        .unwrap()
        .observer(observer.clone())
        .build()
        .unwrap();

    let started = Instant::now();
    assert!(engine.send_alert(JPEG, "Fire"));
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(500), "send_alert took {:?}", elapsed);
    assert!(observer.jobs().is_empty());

    let jobs = observer.wait_for(1, Duration::from_secs(20));
    assert!(jobs[0].outcome("whatsapp").delivered);
}

#[test]
fn test_burst_queues_on_two_workers() {
    let api = MockApi::start();
    slow_whatsapp(&api, Duration::from_millis(200));

    let dir = tempfile::tempdir().unwrap();
    let config = api
        .configured(dir.path())
        .workers(2)
        .imgur_client_id("imgur-client")
        .whatsapp("callmebot-key", "+15551234567")
        .build();
    let observer = Arc::new(RecordingObserver::default());
    let engine = DispatchEngineBuilder::from_config(&config)
        .unwrap()
        .observer(observer.clone())
        .build()
        .unwrap();

    let started = Instant::now();
    for _ in 0..5 {
        assert!(engine.send_alert(JPEG, "Fire"));
    }
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(frame_files(dir.path()).len(), 5);

    assert!(engine.wait_idle(Duration::from_secs(30)));
    let jobs = observer.jobs();
    assert_eq!(jobs.len(), 5);
    assert!(jobs.iter().all(|job| job.outcome("whatsapp").delivered));
    assert_eq!(api.requests_to("/whatsapp.php"), 5);
}

#[test]
fn test_same_instant_events_get_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let engine = DispatchEngineBuilder::new()
        .events_dir(dir.path())
        .cooldown(Duration::ZERO)
        .build()
        .unwrap();

    for _ in 0..50 {
        assert!(engine.send_alert(JPEG, "Fire"));
    }
    assert!(engine.wait_idle(Duration::from_secs(10)));

    let files = frame_files(dir.path());
    assert_eq!(files.len(), 50);
    let mut unique = files.clone();
    unique.dedup();
    assert_eq!(unique.len(), 50);
    assert!(files
        .iter()
        .all(|name| name.starts_with("alert_") && name.ends_with(".jpg")));
}
