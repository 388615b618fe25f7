//! Config file loading: explicit paths, partial files and bad TOML

use cryptoservice::config::{
    ClientConfig, Config, ConfigError, DEFAULT_MESSAGE, DEFAULT_SERVER_URL, DEFAULT_STRENGTH,
    load_config,
};
use std::fs;
use std::net::SocketAddr;

#[test]
fn test_defaults_match_reference_run() {
    let config = Config::default();
    assert_eq!(config.client.server_url, DEFAULT_SERVER_URL);
    assert_eq!(config.client.strength, DEFAULT_STRENGTH);
    assert_eq!(config.client.message, DEFAULT_MESSAGE);
    assert!(config.client.verify_round_trip);
    assert_eq!(config.client.request_timeout_secs, None);
    assert_eq!(
        config.server.bind,
        "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
    );
}

#[test]
fn test_load_full_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cryptoservice.toml");
    fs::write(
        &path,
        r#"
[client]
server_url = "http://10.0.0.5:9000"
strength = 256
message = "你好"
verify_round_trip = false
request_timeout_secs = 30

[server]
bind = "0.0.0.0:9000"
"#,
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(
        config.client,
        ClientConfig {
            server_url: "http://10.0.0.5:9000".to_string(),
            strength: 256,
            message: "你好".to_string(),
            verify_round_trip: false,
            request_timeout_secs: Some(30),
        }
    );
    assert_eq!(config.server.bind.port(), 9000);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    fs::write(&path, "[client]\nstrength = 512\n").unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.client.strength, 512);
    assert_eq!(config.client.server_url, DEFAULT_SERVER_URL);
    assert_eq!(config.client.message, DEFAULT_MESSAGE);
    assert_eq!(config.server, Config::default().server);
}

#[test]
fn test_missing_explicit_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.toml");
    assert!(matches!(
        load_config(Some(&path)),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[client]\nstrength = \"lots\"\n").unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("bad.toml"));
}
