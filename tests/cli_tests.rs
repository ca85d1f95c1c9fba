use std::process::Command;

fn bench_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_probe-bench"))
}

/// Basic smoke tests for CLI functionality
#[test]
fn test_cli_help() {
    let output = bench_bin()
        .arg("--help")
        .output()
        .expect("Failed to execute probe-bench binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage: probe-bench"));
    assert!(stdout.contains("--list-ports"));
}

#[test]
fn test_cli_list_ports_json() {
    let output = bench_bin()
        .arg("--list-ports")
        .arg("--json")
        .output()
        .expect("Failed to execute probe-bench binary");

    assert!(output.status.success());
    let ports: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("port list is not JSON");
    assert!(ports.is_array());
}

#[test]
fn test_cli_json_requires_list_ports() {
    let output = bench_bin()
        .arg("--json")
        .output()
        .expect("Failed to execute probe-bench binary");

    assert!(!output.status.success());
}

#[test]
fn test_cli_rejects_missing_config() {
    let output = bench_bin()
        .args(["--tui", "--config", "/nonexistent/probe-bench.toml"])
        .output()
        .expect("Failed to execute probe-bench binary");

    assert!(!output.status.success());
}
