use std::path::PathBuf;

use neo_impact::config::{ConfigLoader, NASA_DEMO_KEY};

fn config_loader() -> ConfigLoader {
    ConfigLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn config_path() -> PathBuf {
    PathBuf::from("config/service.yaml")
}

#[test]
fn config_loader_reads_fixture() {
    let config = config_loader().load(config_path()).expect("config parses");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.request_timeout_secs, 90);
    assert_eq!(config.population.dataset, "wpgppop");
    assert_eq!(config.population.year, 2020);
    assert_eq!(config.population.max_poll_attempts, 30);
    assert_eq!(config.population.poll_interval_ms, 500);
    assert_eq!(config.geocoding.timeout_secs, 10);
    assert_eq!(config.nasa.api_key(), NASA_DEMO_KEY);
}

#[test]
fn missing_config_file_reports_path() {
    let err = config_loader().load("config/absent.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("absent.yaml"));
}

#[test]
fn broken_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.yaml"), "server:\n  port: not-a-port\n").unwrap();
    assert!(ConfigLoader::new(dir.path()).load("bad.yaml").is_err());
}
