//! Loading configuration files and deriving channel enablement.

use clap::Parser;
use flareguard_cli::{run, Cli};
use flareguard_core::config::AlertConfig;
use tempfile::TempDir;

const CONFIG: &str = r#"{
    // Local deployment
    events_dir: "/var/lib/flareguard/events",
    cooldown_secs: 10,
    workers: 3,
    imgur: { client_id: "imgur-client" },
    whatsapp: { api_key: "callmebot-key", phone: "+15551234567" },
    telegram: { chat_id: "42", timeout_secs: 5 },
}"#;

#[test]
fn test_json5_file_drives_enablement() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flareguard.json5");
    std::fs::write(&path, CONFIG).unwrap();

    let config = AlertConfig::load(&path).unwrap();
    config.validate().unwrap();

    assert_eq!(config.cooldown_secs, 10);
    assert_eq!(config.workers, 3);
    assert_eq!(config.telegram.timeout_secs, 5);
    assert_eq!(config.whatsapp.timeout_secs, 15);

    let statuses = config.channel_statuses();
    assert!(statuses[0].enabled);
    assert!(!statuses[1].enabled);
    assert_eq!(statuses[1].missing, vec!["TELEGRAM_TOKEN"]);
}

#[test]
fn test_shown_config_redacts_secrets() {
    let config = AlertConfig::parse(CONFIG).unwrap();
    let json = config.to_json().unwrap();

    assert!(!json.contains("callmebot-key"));
    assert!(!json.contains("imgur-client"));
    assert!(json.contains("+15551234567"));
}

#[test]
fn test_cli_validates_config_file() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.json5");
    std::fs::write(&good, CONFIG).unwrap();
    let bad = dir.path().join("bad.json5");
    std::fs::write(&bad, "{ workers: 0 }").unwrap();

    let cli = Cli::try_parse_from([
        "flareguard",
        "--config",
        good.to_str().unwrap(),
        "config",
        "validate",
    ])
    .unwrap();
    run(cli).unwrap();

    let cli = Cli::try_parse_from([
        "flareguard",
        "--config",
        bad.to_str().unwrap(),
        "config",
        "validate",
    ])
    .unwrap();
    assert!(run(cli).is_err());
}

#[test]
fn test_cli_reports_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json5");

    let cli = Cli::try_parse_from([
        "flareguard",
        "--config",
        missing.to_str().unwrap(),
        "channels",
    ])
    .unwrap();
    assert!(run(cli).is_err());
}
