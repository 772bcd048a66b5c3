use std::{fs, net::TcpListener, path::Path, process::Command};

fn write_config(dir: &Path, port: u16, secret: &str) -> String {
    let path = dir.join("irec.toml");
    let toml_content = format!(
        r#"
[server]
host = "127.0.0.1"
port = {port}

[api]
base_url = "http://127.0.0.1:9"

[auth.provider]
issuer = "http://127.0.0.1:9"
client_id = "irec-front"

[auth.session]
secret = "{secret}"
"#
    );
    fs::write(&path, toml_content).expect("write toml");
    path.to_string_lossy().into_owned()
}

fn run_server(dir: &Path, config: &str) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_irec-server"))
        .args(["--config", config])
        .current_dir(dir)
        .env_remove("IREC_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("run irec-server")
}

#[test]
fn failed_run_exits_non_zero() {
    let dir = tempfile::tempdir().expect("tmp dir");
    // Holding the port makes the server's bind fail once it starts running.
    let taken = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = taken.local_addr().expect("addr").port();
    let config = write_config(dir.path(), port, "process-test-secret-0123456789abcdef");

    let output = run_server(dir.path(), &config);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Server error"));
    drop(taken);
}

#[test]
fn invalid_config_exits_with_config_error_code() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let config = write_config(dir.path(), 0, "too-short");

    let output = run_server(dir.path(), &config);

    assert_eq!(output.status.code(), Some(2));
}
