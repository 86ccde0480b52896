// Config Persistence Tests
// Round trips through JSON and TOML files and the load/validate contract.

use afrbkit_settings::{Config, SettingsError};
use tempfile::TempDir;

#[test]
fn test_save_and_load_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::new();
    config.resample.angle_threshold_deg = 45.0;
    config.collect.max_points = 1200;
    config.heading.windows = vec![3, 7];
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_and_load_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut config = Config::new();
    config.resample.batch_size = 64;
    config.save_to_file(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"batch_size\": 64"));
    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_load_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[resample]\nbatch_size = 2\n").unwrap();

    match Config::load_from_file(&path) {
        Err(SettingsError::Config(err)) => assert!(err.to_string().contains("batch_size")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_load_rejects_malformed_files() {
    let dir = TempDir::new().unwrap();

    let toml_path = dir.path().join("config.toml");
    std::fs::write(&toml_path, "[resample\n").unwrap();
    assert!(matches!(
        Config::load_from_file(&toml_path),
        Err(SettingsError::TomlError(_))
    ));

    let json_path = dir.path().join("config.json");
    std::fs::write(&json_path, "{").unwrap();
    assert!(matches!(
        Config::load_from_file(&json_path),
        Err(SettingsError::JsonError(_))
    ));
}

#[test]
fn test_save_refuses_invalid_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = Config::new();
    config.collect.max_points = 0;
    assert!(config.save_to_file(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn test_explicit_missing_path_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        Config::load_or_default(Some(&path)),
        Err(SettingsError::IoError(_))
    ));
}
