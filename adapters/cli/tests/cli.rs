use std::{path::PathBuf, process::Command};

use serde_json::Value;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn umbra(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_umbra"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch umbra")
}

fn json_stdout(output: &std::process::Output) -> Value {
    assert!(
        output.status.success(),
        "umbra failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn inspect_reports_doorway_structure() {
    let scene = demo("doorway.json");
    let output = umbra(&["inspect", "--scene", scene.to_str().expect("utf-8 path"), "--json"]);
    let report = json_stdout(&output);

    assert_eq!(report["vertices"], 8);
    assert_eq!(report["polygons"], 2);
    assert_eq!(report["triangles"], 4);
    assert_eq!(report["edges"], 6);
    assert_eq!(report["degenerate_edges"], 0);
    assert_eq!(report["cells"], 3);
    assert_eq!(report["overlaps"], 2);
    assert_eq!(report["bounds"], serde_json::json!([0.0, 20.0, 0.0, 10.0]));
}

#[test]
fn run_catches_an_idle_player() {
    let scene = demo("doorway.json");
    let config = demo("doorway.toml");
    let output = umbra(&[
        "run",
        "--scene",
        scene.to_str().expect("utf-8 path"),
        "--config",
        config.to_str().expect("utf-8 path"),
        "--player-input",
        "-:900",
        "--look-at",
        "20,5",
        "--json",
    ]);
    let summary = json_stdout(&output);

    assert_eq!(summary["steps"], 900);
    assert!(summary["caught_at_step"].is_u64());
    assert_eq!(summary["unreachable_steps"], 0);
    assert_eq!(summary["player"], serde_json::json!([15.0, 5.0]));
}

#[test]
fn text_summary_is_printed_by_default() {
    let scene = demo("doorway.json");
    let output = umbra(&["run", "--scene", scene.to_str().expect("utf-8 path"), "--steps", "10"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("steps:            10"));
    assert!(stdout.contains("path refreshes:"));
}

#[test]
fn missing_scene_fails_with_context() {
    let output = umbra(&["inspect", "--scene", "does-not-exist.json"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read scene"));
}

#[test]
fn malformed_input_script_is_rejected() {
    let scene = demo("doorway.json");
    let output = umbra(&[
        "run",
        "--scene",
        scene.to_str().expect("utf-8 path"),
        "--player-input",
        "wq:3",
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not a movement key"));
}
