use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use dlg_api::{
    create_context_from_json, memory_participants, participant_map, resume_context_from_json,
    CreateContextFromJsonOptions, ResumeContextFromJsonOptions,
};
use dlg_core::DialogueError;
use dlg_runtime::{ContextOptions, DialogueContext, MemoryParticipant, MemoryState};
use tracing::debug;

use crate::{
    emit_boundary, load_player_state, load_source_by_ref, save_player_state, BoundaryEvent,
    BoundaryResult, LoadedSource, PlayerStateV1, StartSelection, PLAYER_STATE_SCHEMA,
};

/// A running context plus the concrete participants bound into it, so their
/// state can be written back after events fired.
pub(crate) struct Session {
    pub(crate) context: DialogueContext,
    pub(crate) participants: BTreeMap<String, Arc<MemoryParticipant>>,
}

impl Session {
    pub(crate) fn participant_states(&self) -> BTreeMap<String, MemoryState> {
        self.participants
            .iter()
            .map(|(name, participant)| (name.clone(), participant.state()))
            .collect()
    }
}

pub(crate) fn create_session(
    source: &LoadedSource,
    start: &StartSelection,
) -> Result<Session, DialogueError> {
    let participants = memory_participants(&source.participants);
    let context = create_context_from_json(CreateContextFromJsonOptions {
        dialogue_json: source.dialogue_json.clone(),
        load: source.load.clone(),
        context: ContextOptions {
            participants: participant_map(&participants),
            random_seed: start.seed,
            ..ContextOptions::default()
        },
        start_index: start.start_index,
        branch_tag: start.branch_tag.clone(),
    })?;
    Ok(Session {
        context,
        participants,
    })
}

pub(crate) fn resume_session(
    source: &LoadedSource,
    state: &PlayerStateV1,
) -> Result<Session, DialogueError> {
    let participants = memory_participants(&state.participants);
    let context = resume_context_from_json(ResumeContextFromJsonOptions {
        dialogue_json: source.dialogue_json.clone(),
        load: source.load.clone(),
        context: ContextOptions {
            participants: participant_map(&participants),
            ..ContextOptions::default()
        },
        snapshot: state.snapshot.clone(),
    })?;
    Ok(Session {
        context,
        participants,
    })
}

pub(crate) fn save_session_state(
    path: &Path,
    session: &Session,
    source: &LoadedSource,
) -> Result<(), DialogueError> {
    let state = PlayerStateV1 {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        source: source.source_ref.clone(),
        participants: session.participant_states(),
        snapshot: session.context.snapshot(),
    };
    debug!(path = %path.display(), "saving player state");
    save_player_state(path, &state)
}

pub(crate) fn load_session_from_state(
    path: &Path,
) -> Result<(LoadedSource, PlayerStateV1, Session), DialogueError> {
    let state = load_player_state(path)?;
    let source = load_source_by_ref(&state.source)?;
    let session = resume_session(&source, &state)?;
    Ok((source, state, session))
}

pub(crate) fn load_session_for_source(
    path: &Path,
    source: &LoadedSource,
) -> Result<Session, DialogueError> {
    let state = load_player_state(path)?;
    if state.source.dialogue != source.source_ref.dialogue {
        return Err(DialogueError::new(
            "TUI_STATE_SOURCE_MISMATCH",
            format!(
                "State dialogue mismatch. expected={} actual={}",
                source.source_ref.dialogue, state.source.dialogue
            ),
        ));
    }
    resume_session(source, &state)
}

/// Saves only while choices are pending; an ended session has nothing to resume.
pub(crate) fn emit_boundary_with_saved_state(
    session: &Session,
    boundary: BoundaryResult,
    state_out: &str,
    source: &LoadedSource,
) -> Result<i32, DialogueError> {
    if boundary.event == BoundaryEvent::Choices {
        save_session_state(Path::new(state_out), session, source)?;
        emit_boundary(boundary, Some(state_out.to_string()))?;
        return Ok(0);
    }

    emit_boundary(boundary, None)?;
    Ok(0)
}
