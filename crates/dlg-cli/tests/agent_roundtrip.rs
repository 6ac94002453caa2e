use std::path::PathBuf;
use std::process::Command;

fn demos_root() -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
}

fn run_cli(args: &[&str]) -> std::process::Output {
    let bin = env!("CARGO_BIN_EXE_dlg-cli");
    Command::new(bin)
        .args(args)
        .output()
        .expect("cli command should run")
}

fn parse_state_out(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("STATE_OUT:").map(|v| v.to_string()))
        .filter(|value| value != "NONE")
}

fn demo_path(demo: &str, file: &str) -> String {
    demos_root()
        .join(demo)
        .join(file)
        .to_str()
        .expect("path should be utf-8")
        .to_string()
}

#[test]
fn agent_choice_flow_reaches_end() {
    let state_1 = std::env::temp_dir().join("dlg-cli-agent-choice-1.json");
    let state_2 = std::env::temp_dir().join("dlg-cli-agent-choice-2.json");

    let start = run_cli(&[
        "agent",
        "start",
        "--dialogue",
        &demo_path("01-merchant", "dialogue.json"),
        "--participants",
        &demo_path("01-merchant", "participants.json"),
        "--state-out",
        state_1.to_str().expect("path should be utf-8"),
    ]);
    assert!(start.status.success(), "start failed");
    let start_stdout = String::from_utf8_lossy(&start.stdout);
    assert!(start_stdout.contains("RESULT:OK"));
    assert!(start_stdout.contains("EVENT:CHOICES"));
    assert!(start_stdout.contains("SPEAKER_JSON:\"Merchant\""));
    assert!(start_stdout.contains("TEXT_JSON:\"Welcome, Ada. Looking to buy?\""));
    assert!(start_stdout.contains("CHOICE:2|\"Goodbye.\""));
    assert!(parse_state_out(&start_stdout).is_some());

    let choose = run_cli(&[
        "agent",
        "choose",
        "--state-in",
        state_1.to_str().expect("path should be utf-8"),
        "--choice",
        "2",
        "--state-out",
        state_2.to_str().expect("path should be utf-8"),
    ]);
    assert!(choose.status.success(), "choose failed");
    let choose_stdout = String::from_utf8_lossy(&choose.stdout);
    assert!(choose_stdout.contains("RESULT:OK"));
    assert!(choose_stdout.contains("EVENT:END"));
    assert!(choose_stdout.contains("END_JSON:"));
    assert!(choose_stdout.contains("STATE_OUT:NONE"));
}

#[test]
fn agent_reports_protocol_errors() {
    let missing = std::env::temp_dir().join("dlg-cli-agent-missing-state.json");
    let _ = std::fs::remove_file(&missing);

    let output = run_cli(&[
        "agent",
        "choose",
        "--state-in",
        missing.to_str().expect("path should be utf-8"),
        "--choice",
        "0",
        "--state-out",
        std::env::temp_dir()
            .join("dlg-cli-agent-unused.json")
            .to_str()
            .expect("path should be utf-8"),
    ]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:CLI_STATE_NOT_FOUND"));
    assert!(stdout.contains("ERROR_MSG_JSON:"));
}
