use std::ffi::OsString;

use clap::Parser;
use dlg_core::DialogueError;
use tracing_subscriber::EnvFilter;

mod agent;
mod authoring;
mod boundary;
mod cli_args;
mod error_map;
mod line_tui;
mod models;
mod session_ops;
mod source_loader;
mod state_store;

pub(crate) use boundary::{collect_boundary, emit_boundary};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, ChooseArgs, Cli, FindTextArgs, InspectArgs, LintArgs, Mode,
    PlayArgs, ReplaceTextArgs, SourceArgs, StartArgs, StartSelection,
};
pub(crate) use error_map::{
    emit_error, json_string, map_cli_dialogue_write, map_cli_output_json, map_cli_source_invalid,
    map_cli_source_path, map_cli_source_read, map_cli_source_scan, map_cli_state_invalid,
    map_cli_state_read, map_cli_state_write, map_tui_io,
};
pub(crate) use line_tui::run_play_line_mode;
pub(crate) use models::{
    BoundaryEvent, BoundaryResult, LoadedSource, PlayerStateV1, SourceRef, TuiCommandAction,
    TuiCommandContext, PLAYER_STATE_SCHEMA,
};
pub(crate) use session_ops::{
    create_session, emit_boundary_with_saved_state, load_session_for_source,
    load_session_from_state, save_session_state, Session,
};
pub(crate) use source_loader::{
    load_source, load_source_by_ref, read_json_or_default, read_text, resolve_dir, resolve_file,
    scan_dialogue_files,
};
pub(crate) use state_store::{load_player_state, save_player_state};

const DEFAULT_STATE_FILE: &str = ".dlg/save.json";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_tracing();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

/// Logs go to stderr so the agent protocol on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, DialogueError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Play(args) => run_play(args),
        Mode::Inspect(args) => authoring::run_inspect(args),
        Mode::Lint(args) => authoring::run_lint(args),
        Mode::FindText(args) => authoring::run_find_text(args),
        Mode::ReplaceText(args) => authoring::run_replace_text(args),
    }
}

fn run_play(args: PlayArgs) -> Result<i32, DialogueError> {
    let state_file = args
        .state_file
        .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
    let source = load_source(&args.source)?;
    let mut session = create_session(&source, &args.start)?;
    run_play_line_mode(&state_file, &source, &args.start, &mut session)
}

#[cfg(test)]
mod cli_test_support;
