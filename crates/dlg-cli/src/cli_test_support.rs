use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    create_session, load_source, LoadedSource, PlayerStateV1, Session, SourceArgs,
    StartSelection, PLAYER_STATE_SCHEMA,
};

pub(crate) fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("dlg-cli-{}-{}", nanos, name))
}

pub(crate) fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent should be created");
    }
    fs::write(path, content).expect("file should be written");
}

pub(crate) fn demos_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
}

pub(crate) fn demo_file(demo: &str, file: &str) -> String {
    demos_root()
        .join(demo)
        .join(file)
        .to_string_lossy()
        .to_string()
}

pub(crate) fn demo_source_args(demo: &str) -> SourceArgs {
    SourceArgs {
        dialogue: demo_file(demo, "dialogue.json"),
        participants: Some(demo_file(demo, "participants.json")),
        settings: None,
        classes: None,
    }
}

pub(crate) fn load_demo_source(demo: &str) -> LoadedSource {
    load_source(&demo_source_args(demo)).expect("demo source should load")
}

pub(crate) fn start_demo_session(demo: &str) -> Session {
    create_session(&load_demo_source(demo), &StartSelection::default())
        .expect("demo session should start")
}

/// State for a merchant session, the demo every state-store test starts from.
pub(crate) fn session_state(session: &Session) -> PlayerStateV1 {
    PlayerStateV1 {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        source: load_demo_source("01-merchant").source_ref,
        participants: session.participant_states(),
        snapshot: session.context.snapshot(),
    }
}
