use dlg_core::DialogueError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> DialogueError {
    DialogueError::new(code, error.to_string())
}

pub(crate) fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

pub(crate) fn emit_error(error: DialogueError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_MSG_JSON:{}", json_string(&error.message));
    if let Some(index) = error.node_index {
        println!("ERROR_NODE:{}", index);
    }
    1
}

pub(crate) fn map_tui_io(error: std::io::Error) -> DialogueError {
    map_error("TUI_IO", error)
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> DialogueError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> DialogueError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> DialogueError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_source_invalid(error: serde_json::Error) -> DialogueError {
    map_error("CLI_SOURCE_INVALID", error)
}

pub(crate) fn map_cli_dialogue_write(error: std::io::Error) -> DialogueError {
    map_error("CLI_DIALOGUE_WRITE", error)
}

pub(crate) fn map_cli_output_json(error: serde_json::Error) -> DialogueError {
    map_error("CLI_OUTPUT_JSON", error)
}

pub(crate) fn map_cli_state_write(error: std::io::Error) -> DialogueError {
    map_error("CLI_STATE_WRITE", error)
}

pub(crate) fn map_cli_state_read(error: std::io::Error) -> DialogueError {
    map_error("CLI_STATE_READ", error)
}

pub(crate) fn map_cli_state_invalid(error: serde_json::Error) -> DialogueError {
    map_error("CLI_STATE_INVALID", error)
}
