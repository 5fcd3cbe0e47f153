use pushbox_core::InboxConfig;
use pushbox_infrastructure::ConfigService;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let service = ConfigService::with_path(temp_dir.path().join("config.toml"));

    let config = service.get_config().expect("Should load defaults");
    assert_eq!(config, InboxConfig::default());
}

#[test]
fn test_load_overrides_from_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "live_delivery = true\nfetch_opening_on_start = false\nfixture = \"inbox.json\"\n",
    )
    .unwrap();

    let config = ConfigService::with_path(&config_path).get_config().unwrap();

    assert!(config.live_delivery);
    assert!(config.refresh_on_start);
    assert!(!config.fetch_opening_on_start);
    assert_eq!(config.fixture, Some(PathBuf::from("inbox.json")));
}

#[test]
fn test_invalid_toml_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "live_delivery = \"maybe\"").unwrap();

    let err = ConfigService::with_path(&config_path)
        .get_config()
        .unwrap_err();
    assert!(err.is_serialization());
}

#[test]
fn test_cache_until_invalidated() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let service = ConfigService::with_path(&config_path);

    assert!(!service.get_config().unwrap().live_delivery);
    std::fs::write(&config_path, "live_delivery = true").unwrap();

    // Still served from cache
    assert!(!service.get_config().unwrap().live_delivery);

    service.invalidate_cache();
    assert!(service.get_config().unwrap().live_delivery);
}

#[test]
fn test_save_creates_directory_and_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nested").join("config.toml");
    let service = ConfigService::with_path(&config_path);

    let config = InboxConfig {
        live_delivery: true,
        ..InboxConfig::default()
    };
    service.save(&config).expect("Should save config");

    let reloaded = ConfigService::with_path(&config_path).get_config().unwrap();
    assert_eq!(reloaded, config);
}
