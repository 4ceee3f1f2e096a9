use emotitask::config::AppConfig;
use tempfile::TempDir;

#[test]
fn missing_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = AppConfig::load_from(tmp.path().join("absent.toml")).unwrap();
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.openai.temperature, 0.7);
}

#[test]
fn file_values_are_loaded() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[server]
host = "127.0.0.1"
log_level = "debug"

[openai]
model = "gpt-4o-mini"
max_tokens = 300
"#,
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.openai.model, "gpt-4o-mini");
    assert_eq!(config.openai.max_tokens, 300);
    assert_eq!(config.dev.memory_capacity, 10_000);
}

#[test]
fn invalid_toml_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[server\nport = ").unwrap();

    let err = AppConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse config TOML"));
}
