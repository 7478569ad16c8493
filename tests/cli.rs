//! Exit statuses of the keywarden binary.

mod common;

use common::Authority;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn keywarden(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_keywarden"))
        .arg("--dir")
        .arg(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run keywarden")
}

fn status(output: &Output) -> i32 {
    output.status.code().expect("exited normally")
}

fn generated_code(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("License generated: "))
        .expect("code in generate output")
        .trim()
        .to_string()
}

#[test]
fn init_generate_verify_revoke() {
    let dir = TempDir::new().unwrap();

    assert_eq!(status(&keywarden(dir.path(), &["init"])), 0);
    assert!(dir.path().join("private_key.pem").exists());

    let generated = keywarden(dir.path(), &["generate", "--length", "12", "--duration-days", "30"]);
    assert_eq!(status(&generated), 0);
    let code = generated_code(&generated);
    assert_eq!(code.len(), 12);

    assert_eq!(status(&keywarden(dir.path(), &["verify", &code])), 0);
    assert_eq!(status(&keywarden(dir.path(), &["revoke", &code])), 0);

    let rejected = keywarden(dir.path(), &["verify", &code]);
    assert_eq!(status(&rejected), 1);
    assert!(String::from_utf8_lossy(&rejected.stdout).contains("REVOKED"));

    // A second init without --force must not replace the keys
    assert_eq!(status(&keywarden(dir.path(), &["init"])), 2);
}

#[test]
fn verify_and_revoke_unknown_code() {
    let authority = Authority::new();
    let dir = authority.dir.path();

    let output = keywarden(dir, &["verify", "UNKNOWN"]);
    assert_eq!(status(&output), 1);
    assert!(String::from_utf8_lossy(&output.stdout).contains("NOT_FOUND"));

    assert_eq!(status(&keywarden(dir, &["revoke", "UNKNOWN"])), 1);
}

#[test]
fn expired_license_is_rejected() {
    let authority = Authority::new();
    let dir = authority.dir.path();

    let generated = keywarden(dir, &["generate", "--duration-days", "-1"]);
    assert_eq!(status(&generated), 0);
    let code = generated_code(&generated);

    let output = keywarden(dir, &["verify", &code]);
    assert_eq!(status(&output), 1);
    assert!(String::from_utf8_lossy(&output.stdout).contains("EXPIRED"));
}

#[test]
fn invalid_parameters_are_errors() {
    let authority = Authority::new();
    let dir = authority.dir.path();

    let output = keywarden(dir, &["generate", "--length", "4"]);
    assert_eq!(status(&output), 2);
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));

    let output = keywarden(
        dir,
        &["generate", "--duration-days", "-9223372036854775808"],
    );
    assert_eq!(status(&output), 2);
}

#[test]
fn generate_without_init_is_an_error() {
    let dir = TempDir::new().unwrap();
    let output = keywarden(dir.path(), &["generate"]);
    assert_eq!(status(&output), 2);
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn list_shows_issued_licenses() {
    let authority = Authority::new();
    let dir = authority.dir.path();

    let code = generated_code(&keywarden(dir, &["generate"]));
    let output = keywarden(dir, &["list"]);
    assert_eq!(status(&output), 0);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&code));
    assert!(stdout.contains("ISSUED"));
}
