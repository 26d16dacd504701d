//! Integration tests for configuration loading

use std::io::Write;

use rootline_infra::config;
use tempfile::NamedTempFile;

#[test]
fn loads_config_from_toml_file() {
    let toml_content = r#"
[service]
api_url = "https://tree.example.com"
username = "owner"
password = "secret"
tree_id = "smith-family"

[polling]
task_timeout_secs = 90
"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(toml_content.as_bytes()).expect("Failed to write to temp file");

    let config = config::load_from_file(Some(temp_file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.service.api_url, "https://tree.example.com");
    assert_eq!(config.service.username, "owner");
    assert_eq!(config.service.tree_id, "smith-family");
    assert_eq!(config.polling.task_timeout_secs, 90);
    assert_eq!(config.service.api_base(), "https://tree.example.com/api");
}

#[test]
fn polling_section_is_optional() {
    let toml_content = r#"
[service]
api_url = "https://tree.example.com/api"
username = "owner"
password = "secret"
tree_id = "default"
"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(toml_content.as_bytes()).expect("Failed to write to temp file");

    let config = config::load_from_file(Some(temp_file.path().to_path_buf()))
        .expect("Failed to load config without polling section");

    assert_eq!(config.polling.task_timeout_secs, 60);
}

#[test]
fn missing_file_is_a_config_error() {
    let result = config::load_from_file(Some("/nonexistent/rootline.toml".into()));
    assert!(result.is_err());
}

#[test]
fn invalid_toml_is_a_config_error() {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(b"not valid toml [[[").expect("Failed to write to temp file");

    let result = config::load_from_file(Some(temp_file.path().to_path_buf()));
    assert!(result.is_err());
}
