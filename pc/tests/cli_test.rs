//! Smoke tests for the `pc` binary

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"
log-level: debug
service:
  base-url: http://127.0.0.1:9
platforms:
  - id: linkedin
    name: LinkedIn
    character-limit: 3000
  - id: mastodon
    name: Mastodon
    character-limit: 500
"#;

fn pc(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pc").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .current_dir(home.path());
    cmd
}

fn write_config(home: &TempDir) -> std::path::PathBuf {
    let path = home.path().join("postcraft.yml");
    std::fs::write(&path, CONFIG).unwrap();
    path
}

#[test]
fn test_platforms_lists_configured_catalogue() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home);

    pc(&home)
        .args(["platforms", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("LinkedIn"))
        .stdout(predicate::str::contains("Mastodon"))
        .stdout(predicate::str::contains("Bluesky").not());
}

#[test]
fn test_platforms_json_output() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home);

    let output = pc(&home)
        .args(["platforms", "--format", "json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let platforms = value.as_array().unwrap();
    assert_eq!(platforms.len(), 2);
    assert_eq!(platforms[1]["id"], "mastodon");
    assert_eq!(platforms[1]["character-limit"], 500);
}

#[test]
fn test_platforms_defaults_to_standard_catalogue() {
    let home = TempDir::new().unwrap();

    pc(&home)
        .arg("platforms")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bluesky"))
        .stdout(predicate::str::contains("280"));
}

#[test]
fn test_generate_rejects_unknown_platform_before_calling_service() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home);

    pc(&home)
        .args(["generate", "launch day", "-p", "myspace", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("myspace"));
}

#[test]
fn test_missing_config_file_fails() {
    let home = TempDir::new().unwrap();

    pc(&home)
        .args(["platforms", "--config", "does-not-exist.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

/// Serve `bodies` as 200 JSON responses, one per connection, returning the base URL
fn serve(bodies: Vec<&'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for body in bodies {
            let (mut stream, _) = listener.accept().unwrap();
            drain_request(&mut stream);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        }
    });
    format!("http://{}", addr)
}

/// Read headers and the Content-Length body so the client sees a clean response
fn drain_request(stream: &mut std::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < end + 4 + length {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    return;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            return;
        }
    }
}

#[test]
fn test_generate_with_repeated_platform_keeps_it_selected() {
    let home = TempDir::new().unwrap();
    let base_url = serve(vec![
        r#"{"generated_content": "Launch day draft"}"#,
        r#"{"formatted_content": "Launch day for X"}"#,
    ]);
    let config = home.path().join("postcraft.yml");
    std::fs::write(
        &config,
        format!("service:\n  base-url: {}\n  max-retries: 0\nplatforms: standard\n", base_url),
    )
    .unwrap();

    pc(&home)
        .args(["generate", "launch day", "-p", "x", "-p", "X", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Launch day draft"))
        .stdout(predicate::str::contains("Launch day for X"));
}
