use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use lsp_connection::config::{ConfigOverrides, ConnectionConfig};
use lsp_connection::AppError;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn parses_full_toml() {
    let toml = r#"
client_host = "editor.local"
client_port = 9000
server_port = 9001
bind_host = "127.0.0.1"
connect_timeout_seconds = 5
tcp_nodelay = false
"#;
    let config = ConnectionConfig::from_toml_str(toml).expect("config parses");

    assert_eq!(config.client_host.as_deref(), Some("editor.local"));
    assert_eq!(config.client_port, Some(9000));
    assert_eq!(config.server_port, Some(9001));
    assert_eq!(config.bind_host, "127.0.0.1");
    assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
    assert!(!config.tcp_nodelay);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = ConnectionConfig::from_toml_str("").expect("config parses");
    assert_eq!(config, ConnectionConfig::default());
    assert_eq!(config.bind_host, "0.0.0.0");
    assert!(config.tcp_nodelay);
    assert!(config.connect_timeout().is_none());
}

#[test]
fn rejects_out_of_range_port_in_toml() {
    let result = ConnectionConfig::from_toml_str("client_port = 70000");
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn rejects_zero_connect_timeout() {
    let result = ConnectionConfig::from_toml_str("connect_timeout_seconds = 0");
    assert!(matches!(
        result,
        Err(AppError::Config(msg)) if msg.contains("connect_timeout_seconds")
    ));
}

#[test]
fn rejects_empty_bind_host() {
    let result = ConnectionConfig::from_toml_str(r#"bind_host = "  ""#);
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "server_port = 5007").expect("write config");

    let config = ConnectionConfig::load_from_path(file.path()).expect("config loads");
    assert_eq!(config.server_port, Some(5007));
}

#[test]
fn missing_file_is_config_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let result = ConnectionConfig::load_from_path(temp.path().join("absent.toml"));
    assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("failed to read config")));
}

#[test]
fn lookup_reads_all_variables() {
    let config = ConnectionConfig::from_lookup(lookup(&[
        ("CLIENT_HOST", "10.0.0.2"),
        ("CLIENT_PORT", "9000"),
        ("SERVER_HOST", "127.0.0.1"),
        ("SERVER_PORT", "9001"),
    ]))
    .expect("config builds");

    assert_eq!(config.client_host.as_deref(), Some("10.0.0.2"));
    assert_eq!(config.client_port, Some(9000));
    assert_eq!(config.bind_host, "127.0.0.1");
    assert_eq!(config.server_port, Some(9001));
}

#[test]
fn lookup_without_variables_is_default() {
    let config = ConnectionConfig::from_lookup(lookup(&[])).expect("config builds");
    assert_eq!(config, ConnectionConfig::default());
}

#[test]
fn lookup_treats_blank_values_as_unset() {
    let config =
        ConnectionConfig::from_lookup(lookup(&[("CLIENT_PORT", "  "), ("SERVER_HOST", "")]))
            .expect("config builds");
    assert!(config.client_port.is_none());
    assert_eq!(config.bind_host, "0.0.0.0");
}

#[test]
fn lookup_rejects_malformed_port() {
    let result = ConnectionConfig::from_lookup(lookup(&[("SERVER_PORT", "http")]));
    assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("SERVER_PORT")));
}

#[test]
#[serial_test::serial]
fn from_env_reads_process_environment() {
    std::env::set_var("CLIENT_PORT", "6100");
    std::env::set_var("CLIENT_HOST", "127.0.0.1");
    std::env::remove_var("SERVER_PORT");
    std::env::remove_var("SERVER_HOST");

    let config = ConnectionConfig::from_env();

    std::env::remove_var("CLIENT_PORT");
    std::env::remove_var("CLIENT_HOST");

    let config = config.expect("config builds");
    assert_eq!(config.client_port, Some(6100));
    assert_eq!(config.client_host.as_deref(), Some("127.0.0.1"));
}

#[test]
fn overrides_replace_only_present_values() {
    let mut config = ConnectionConfig {
        client_host: Some("file-host".into()),
        server_port: Some(9001),
        ..ConnectionConfig::default()
    };

    config.apply_overrides(ConfigOverrides {
        client_port: Some(9100),
        bind_host: Some("127.0.0.1".into()),
        ..ConfigOverrides::default()
    });

    assert_eq!(config.client_host.as_deref(), Some("file-host"));
    assert_eq!(config.client_port, Some(9100));
    assert_eq!(config.server_port, Some(9001));
    assert_eq!(config.bind_host, "127.0.0.1");
}
