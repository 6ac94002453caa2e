use std::path::Path;

use dlg_core::DialogueError;

use crate::{
    collect_boundary, create_session, emit_boundary_with_saved_state, load_session_from_state,
    load_source, AgentArgs, AgentCommand, ChooseArgs, StartArgs,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, DialogueError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Choose(args) => run_choose(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, DialogueError> {
    let source = load_source(&args.source)?;
    let session = create_session(&source, &args.start)?;
    let boundary = collect_boundary(&session.context);
    emit_boundary_with_saved_state(&session, boundary, &args.state_out, &source)
}

pub(super) fn run_choose(args: ChooseArgs) -> Result<i32, DialogueError> {
    let (source, _state, mut session) = load_session_from_state(Path::new(&args.state_in))?;
    session.context.choose_option(args.choice)?;
    let boundary = collect_boundary(&session.context);
    emit_boundary_with_saved_state(&session, boundary, &args.state_out, &source)
}
