use std::fs;
use std::process::Command;

fn demo_directories() -> Vec<std::path::PathBuf> {
    let demos_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos");
    let mut directories = fs::read_dir(&demos_root)
        .expect("demos root must exist")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();
    directories.sort();
    assert!(!directories.is_empty(), "expected demo dialogues");
    directories
}

fn run(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_dlg-cli"))
        .args(args)
        .output()
        .expect("cli should execute");
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn agent_start_and_inspect_run_all_demos() {
    for directory in demo_directories() {
        let dialogue = directory.join("dialogue.json");
        let dialogue = dialogue.to_str().expect("path should be utf-8");
        let participants = directory.join("participants.json");
        let participants = participants.to_str().expect("path should be utf-8");
        let state_out = std::env::temp_dir().join(format!(
            "dlg-cli-smoke-{}.json",
            directory.file_name().unwrap_or_default().to_string_lossy()
        ));

        let (ok, stdout, stderr) = run(&[
            "agent",
            "start",
            "--dialogue",
            dialogue,
            "--participants",
            participants,
            "--state-out",
            state_out.to_str().expect("path should be utf-8"),
        ]);
        if !ok {
            panic!(
                "demo {} failed\nstdout:\n{}\nstderr:\n{}",
                directory.display(),
                stdout,
                stderr
            );
        }
        assert!(stdout.contains("RESULT:OK"), "{}", directory.display());
        assert!(stdout.contains("EVENT:"), "{}", directory.display());

        let (ok, stdout, _) = run(&[
            "inspect",
            "--dialogue",
            dialogue,
            "--participants",
            participants,
        ]);
        assert!(ok, "inspect failed for {}", directory.display());
        assert!(stdout.contains("RESULT:OK"));
        assert!(!stdout.contains("UNBOUND_PARTICIPANT:"), "{}", stdout);
        assert!(!stdout.contains("DIAGNOSTIC:"), "{}", stdout);
    }
}

#[test]
fn lint_passes_on_demo_corpus() {
    let demos_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos");
    let (ok, stdout, _) = run(&[
        "lint",
        "--dir",
        demos_root.to_str().expect("path should be utf-8"),
    ]);
    assert!(ok, "{}", stdout);
    assert!(stdout.starts_with("RESULT:OK"));
    assert!(stdout.contains("ERRORS:0"));
    assert!(stdout.contains("WARNINGS:0"));
}
