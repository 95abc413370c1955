//! Tests for the layered configuration manager
//!
//! Each test works on an isolated config file so the user's configuration
//! is never read or written.

use pathcat_cli::config::ConfigManager;
use std::fs;
use tempfile::TempDir;

fn create_test_config_manager(temp_dir: &TempDir) -> ConfigManager {
    ConfigManager::with_path(temp_dir.path().join("pathcat").join("config.toml"))
}

#[test]
fn test_load_without_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config_manager(&temp_dir).load().unwrap();

    assert!(config.crawl.follow_links);
    assert_eq!(config.crawl.max_depth, None);
    assert_eq!(config.output.default_format, "text");
}

#[test]
fn test_set_creates_file_and_parent_dirs() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    manager.set("crawl.follow_links", "false").unwrap();

    assert!(manager.config_path().exists());
    assert_eq!(manager.get("crawl.follow_links").unwrap(), "false");
    assert!(!manager.load().unwrap().crawl.follow_links);
}

#[test]
fn test_set_keeps_existing_values() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    manager.set("output.default_format", "csv").unwrap();
    manager.set("crawl.max_depth", "2").unwrap();

    let config = manager.load().unwrap();
    assert_eq!(config.output.default_format, "csv");
    assert_eq!(config.crawl.max_depth, Some(2));
}

#[test]
fn test_named_templates_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    manager
        .set("templates.archive", "{site}/{year:d}/data_{month:02d}.csv")
        .unwrap();

    let config = manager.load().unwrap();
    assert_eq!(
        config.template("archive"),
        Some("{site}/{year:d}/data_{month:02d}.csv")
    );
    assert_eq!(config.template("other"), None);
}

#[test]
fn test_invalid_template_is_not_saved() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);

    assert!(manager.set("templates.broken", "{site").is_err());
    assert!(!manager.config_path().exists());
}

#[test]
fn test_file_values_are_loaded() {
    let temp_dir = TempDir::new().unwrap();
    let manager = create_test_config_manager(&temp_dir);
    fs::create_dir_all(manager.config_path().parent().unwrap()).unwrap();
    fs::write(
        manager.config_path(),
        "[output]\nprogress_enabled = false\n\n[templates]\nmodel = \"{model}/{exp}\"\n",
    )
    .unwrap();

    let config = manager.load().unwrap();
    assert!(!config.output.progress_enabled);
    // Keys the file omits keep their defaults
    assert!(config.output.color_enabled);
    assert_eq!(config.template("model"), Some("{model}/{exp}"));
}

#[test]
fn test_malformed_file_fails_to_load() {
    let temp_dir = TempDir::new().unwrap();
    let manager = create_test_config_manager(&temp_dir);
    fs::create_dir_all(manager.config_path().parent().unwrap()).unwrap();
    fs::write(manager.config_path(), "[crawl]\nfollow_links = \"sometimes\"\n").unwrap();

    assert!(manager.load().is_err());
}

#[test]
fn test_list_is_sorted_and_flat() {
    let temp_dir = TempDir::new().unwrap();
    let mut manager = create_test_config_manager(&temp_dir);
    manager.set("templates.archive", "{site}/{name}.csv").unwrap();

    let items = manager.list().unwrap();
    let keys: Vec<&str> = items.iter().map(|(key, _)| key.as_str()).collect();

    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert!(keys.contains(&"crawl.follow_links"));
    assert!(keys.contains(&"templates.archive"));
}

#[test]
fn test_get_unknown_key() {
    let temp_dir = TempDir::new().unwrap();
    let manager = create_test_config_manager(&temp_dir);

    assert!(manager.get("crawl.unknown").is_err());
}
