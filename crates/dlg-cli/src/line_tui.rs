use std::io::{self, BufRead, Write};
use std::path::Path;

use dlg_core::DialogueError;

use crate::{
    collect_boundary, create_session, load_session_for_source, map_tui_io, save_session_state,
    BoundaryEvent, LoadedSource, Session, StartSelection, TuiCommandAction, TuiCommandContext,
};

const HELP: &str = "commands: :help :all :save :load :restart :quit";

pub(crate) fn run_play_line_mode(
    state_file: &str,
    source: &LoadedSource,
    start: &StartSelection,
    session: &mut Session,
) -> Result<i32, DialogueError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_play_line_mode_with_io(state_file, source, start, session, &mut reader, &mut writer)
}

pub(crate) fn run_play_line_mode_with_io(
    state_file: &str,
    source: &LoadedSource,
    start: &StartSelection,
    session: &mut Session,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, DialogueError> {
    writeln!(writer, "Dialogue player").map_err(map_tui_io)?;
    writeln!(writer, "{}", HELP).map_err(map_tui_io)?;
    let command_context = TuiCommandContext {
        state_file,
        source,
        start,
    };

    loop {
        let boundary = collect_boundary(&session.context);
        writeln!(writer).map_err(map_tui_io)?;
        for text in &boundary.texts {
            let written = match &boundary.speaker {
                Some(speaker) => writeln!(writer, "{}: {}", speaker, text),
                None => writeln!(writer, "{}", text),
            };
            written.map_err(map_tui_io)?;
        }
        if boundary.event == BoundaryEvent::End {
            writeln!(writer, "[END]").map_err(map_tui_io)?;
            return Ok(0);
        }
        for (index, text) in &boundary.choices {
            writeln!(writer, "  [{}] {}", index, text).map_err(map_tui_io)?;
        }

        loop {
            let raw = prompt_input_from("> ", reader, writer)?;
            let mut lines = Vec::new();
            let action = {
                let mut emit = |line: String| lines.push(line);
                handle_line_cmd(raw.as_str(), &command_context, session, &mut emit)?
            };
            for line in lines {
                writeln!(writer, "{}", line).map_err(map_tui_io)?;
            }
            match action {
                TuiCommandAction::Continue => continue,
                TuiCommandAction::RefreshBoundary => break,
                TuiCommandAction::Quit => return Ok(0),
                TuiCommandAction::NotHandled => {}
            }
            let choice = raw.parse::<usize>().map_err(|_| {
                DialogueError::new(
                    "TUI_CHOICE_PARSE",
                    format!("Invalid choice index: {}", raw),
                )
            })?;
            session.context.choose_option(choice)?;
            break;
        }
    }
}

pub(crate) fn handle_play_command(
    raw: &str,
    state_file: &str,
    source: &LoadedSource,
    start: &StartSelection,
    session: &mut Session,
    emit: &mut dyn FnMut(String),
) -> Result<TuiCommandAction, DialogueError> {
    match raw {
        ":help" => {
            emit(HELP.to_string());
            Ok(TuiCommandAction::Continue)
        }
        ":all" => {
            for (index, option) in session.context.all_options().iter().enumerate() {
                let marker = if option.satisfied { ' ' } else { 'x' };
                emit(format!("  {}{} {}", marker, index, option.text));
            }
            Ok(TuiCommandAction::Continue)
        }
        ":save" => {
            save_session_state(Path::new(state_file), session, source)?;
            emit(format!("saved: {}", state_file));
            Ok(TuiCommandAction::Continue)
        }
        ":load" => {
            *session = load_session_for_source(Path::new(state_file), source)?;
            emit(format!("loaded: {}", state_file));
            Ok(TuiCommandAction::RefreshBoundary)
        }
        ":restart" => {
            *session = create_session(source, start)?;
            emit("restarted".to_string());
            Ok(TuiCommandAction::RefreshBoundary)
        }
        ":quit" => {
            emit("bye".to_string());
            Ok(TuiCommandAction::Quit)
        }
        _ => Ok(TuiCommandAction::NotHandled),
    }
}

pub(crate) fn handle_line_cmd(
    raw: &str,
    context: &TuiCommandContext<'_>,
    session: &mut Session,
    emit: &mut dyn FnMut(String),
) -> Result<TuiCommandAction, DialogueError> {
    handle_play_command(
        raw,
        context.state_file,
        context.source,
        context.start,
        session,
        emit,
    )
}

/// End of input reads as `:quit`.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<String, DialogueError> {
    write!(writer, "{}", prefix).map_err(map_tui_io)?;
    writer.flush().map_err(map_tui_io)?;
    let mut input = String::new();
    if reader.read_line(&mut input).map_err(map_tui_io)? == 0 {
        return Ok(":quit".to_string());
    }
    Ok(input.trim_end_matches(&['\r', '\n'][..]).to_string())
}
