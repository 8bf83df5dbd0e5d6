//! End-to-end dispatch scenarios against stubbed Imgur, CallMeBot, and
//! Telegram endpoints.

use flareguard_channels::DispatchEngineBuilder;
use flareguard_integration_tests::{
    frame_files, imgur_success, telegram_photo_sent, MockApi, RecordingObserver, JPEG,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(20);

fn mount_telegram(api: &MockApi) {
    api.mount(
        Mock::given(method("POST"))
            .and(path_regex("(?i)/sendphoto$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(telegram_photo_sent())),
    );
}

#[test]
fn test_all_channels_succeed() {
    let api = MockApi::start();
    api.mount(
        Mock::given(method("POST"))
            .and(path("/3/upload"))
            .and(header("authorization", "Client-ID imgur-client"))
            .respond_with(ResponseTemplate::new(200).set_body_json(imgur_success()))
            .expect(1),
    );
    api.mount(
        Mock::given(method("GET"))
            .and(path("/whatsapp.php"))
            .and(query_param("phone", "+15551234567"))
            .and(query_param("apikey", "callmebot-key"))
            .and(query_param(
                "text",
                "🚨 Fire Detected! View at https://i.imgur.com/abc123.jpg",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string("Message queued"))
            .expect(1),
    );
    mount_telegram(&api);

    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events");
    let observer = Arc::new(RecordingObserver::default());
    let engine = DispatchEngineBuilder::from_config(&api.full_config(&events))
        .unwrap()
        .observer(observer.clone())
        .build()
        .unwrap();
    assert_eq!(engine.enabled_channels(), vec!["whatsapp", "telegram"]);

    assert!(engine.send_default_alert(JPEG));
    let jobs = observer.wait_for(1, WAIT);
    assert_eq!(jobs.len(), 1);

    let job = &jobs[0];
    assert_eq!(job.label, "Fire");
    assert!(job.outcome("whatsapp").delivered);
    assert!(job.outcome("telegram").delivered);
    assert_eq!(job.outcome("telegram").recipients.len(), 1);
    assert_eq!(job.outcome("telegram").recipients[0].recipient, "42");
    assert!(job.outcome("telegram").recipients[0].delivered);
    assert_eq!(job.outcome("telegram").recipients[0].error, None);

    assert!(job.frame.path.exists());
    assert_eq!(std::fs::read(&job.frame.path).unwrap(), JPEG);
    assert_eq!(api.requests_to("/sendphoto"), 1);
}

#[test]
fn test_upload_failure_only_fails_whatsapp() {
    let api = MockApi::start();
    api.mount(
        Mock::given(method("POST"))
            .and(path("/3/upload"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Imgur is over capacity")),
    );
    api.mount(
        Mock::given(method("GET"))
            .and(path("/whatsapp.php"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0),
    );
    mount_telegram(&api);

    let dir = tempfile::tempdir().unwrap();
    let observer = Arc::new(RecordingObserver::default());
    let engine = DispatchEngineBuilder::from_config(&api.full_config(dir.path()))
        .unwrap()
        .observer(observer.clone())
        .build()
        .unwrap();

    assert!(engine.send_alert(JPEG, "Fire"));
    let jobs = observer.wait_for(1, WAIT);
    assert_eq!(jobs.len(), 1);

    let whatsapp = jobs[0].outcome("whatsapp");
    assert!(!whatsapp.delivered);
    assert!(whatsapp.error.as_deref().unwrap().contains("upload"));

    assert!(jobs[0].outcome("telegram").delivered);
    assert_eq!(api.requests_to("/sendphoto"), 1);
    assert_eq!(api.requests_to("/whatsapp.php"), 0);
}

#[test]
fn test_no_credentials_persists_without_network() {
    let api = MockApi::start();
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events");
    let config = api.configured(&events).build();

    let observer = Arc::new(RecordingObserver::default());
    let engine = DispatchEngineBuilder::from_config(&config)
        .unwrap()
        .observer(observer.clone())
        .build()
        .unwrap();
    assert!(engine.enabled_channels().is_empty());

    assert!(engine.send_alert(JPEG, "Fire"));
    assert!(engine.wait_idle(WAIT));

    assert_eq!(frame_files(&events).len(), 1);
    assert!(observer.jobs()[0].outcomes.is_empty());
    assert!(api.requests().is_empty());
}

#[test]
fn test_whatsapp_requires_both_credentials() {
    let api = MockApi::start();
    let dir = tempfile::tempdir().unwrap();
    let mut config = api.full_config(dir.path());
    config.whatsapp.api_key = None;

    let engine = DispatchEngineBuilder::from_config(&config)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(engine.enabled_channels(), vec!["telegram"]);

    let mut config = api.full_config(dir.path());
    config.telegram.token = None;
    let engine = DispatchEngineBuilder::from_config(&config)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(engine.enabled_channels(), vec!["whatsapp"]);
}
