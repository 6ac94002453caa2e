use std::collections::BTreeMap;

use dlg_api::LoadDialogueOptions;
use dlg_runtime::{ContextSnapshot, EndOutcome, MemoryState};
use serde::{Deserialize, Serialize};

use crate::StartSelection;

pub(crate) const PLAYER_STATE_SCHEMA: &str = "dlg-player-state.v1";

/// Absolute paths of the files a session was started from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SourceRef {
    pub(crate) dialogue: String,
    #[serde(default)]
    pub(crate) participants: Option<String>,
    #[serde(default)]
    pub(crate) settings: Option<String>,
    #[serde(default)]
    pub(crate) classes: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct LoadedSource {
    pub(crate) source_ref: SourceRef,
    pub(crate) dialogue_json: String,
    pub(crate) load: LoadDialogueOptions,
    pub(crate) participants: BTreeMap<String, MemoryState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerStateV1 {
    pub(crate) schema_version: String,
    pub(crate) source: SourceRef,
    /// Participant states as left by the events fired so far.
    pub(crate) participants: BTreeMap<String, MemoryState>,
    pub(crate) snapshot: ContextSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Choices,
    End,
}

#[derive(Debug, Clone)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) speaker: Option<String>,
    pub(crate) texts: Vec<String>,
    pub(crate) choices: Vec<(usize, String)>,
    pub(crate) end: Option<EndOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TuiCommandAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}

pub(crate) struct TuiCommandContext<'a> {
    pub(crate) state_file: &'a str,
    pub(crate) source: &'a LoadedSource,
    pub(crate) start: &'a StartSelection,
}
