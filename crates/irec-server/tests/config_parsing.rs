use std::{env, fs, time::Duration};

use irec_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("irec.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
request_timeout = "15s"
body_limit_bytes = 4096

[api]
base_url = "http://localhost:8080"

[logging]
level = "debug"

[auth.provider]
issuer = "https://irec.eu.auth0.com/"
client_id = "irec-front"
client_secret = "shh"
callback_url = "http://localhost:8081/callback"
scopes = ["openid", "profile", "email"]

[auth.session]
secret = "a-session-secret-that-is-long-enough"
max_age = "12h"
login_ttl = "5m"

[auth.http]
timeout = "3s"

[auth.http.retry]
max_retries = 2
backoff = "100ms"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.request_timeout, Duration::from_secs(15));
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.auth.provider.scopes.len(), 3);
    assert_eq!(cfg.auth.session.max_age, Duration::from_secs(12 * 3600));
    assert_eq!(cfg.auth.session.login_ttl, Duration::from_secs(300));
    assert_eq!(cfg.auth.session.cookie_name, "auth-session");
    assert!(!cfg.auth.session.enforce_token_expiry);
    assert_eq!(cfg.auth.http.timeout, Duration::from_secs(3));
    assert_eq!(cfg.auth.http.retry.max_retries, 2);
    assert_eq!(
        cfg.auth.provider.token_url().unwrap().as_str(),
        "https://irec.eu.auth0.com/oauth/token"
    );

    // 2) Env override should win over file
    unsafe {
        env::set_var("IREC__SERVER__PORT", "9090");
        env::set_var("IREC__AUTH__SESSION__ENFORCE_TOKEN_EXPIRY", "true");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9090);
    assert!(cfg_env.auth.session.enforce_token_expiry);
    unsafe {
        env::remove_var("IREC__SERVER__PORT");
        env::remove_var("IREC__AUTH__SESSION__ENFORCE_TOKEN_EXPIRY");
    }

    // 3) Invalid config is rejected with the offending key
    let bad = toml_content.replace(
        "secret = \"a-session-secret-that-is-long-enough\"",
        "secret = \"short\"",
    );
    fs::write(&path, bad).expect("write bad toml");
    let err = load_config(path.to_str()).expect_err("short secret must fail");
    assert!(err.contains("auth.session.secret"), "{err}");

    let bad = toml_content.replace("level = \"debug\"", "level = \"loud\"");
    fs::write(&path, bad).expect("write bad toml");
    let err = load_config(path.to_str()).expect_err("unknown level must fail");
    assert!(err.contains("logging.level"), "{err}");
}

#[test]
fn missing_file_without_required_settings_fails() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("absent.toml");

    let err = load_config(path.to_str()).expect_err("required settings are missing");
    assert!(err.contains("api.base_url"), "{err}");
}
