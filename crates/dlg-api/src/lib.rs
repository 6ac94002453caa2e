use std::collections::BTreeMap;
use std::sync::Arc;

use dlg_core::DialogueError;
use dlg_graph::{Diagnostic, Dialogue, DialogueSettings, ParticipantClassCatalog};
use dlg_runtime::{
    ContextOptions, ContextSnapshot, DialogueContext, DialogueParticipant, MemoryParticipant,
    MemoryState, ParticipantMap,
};

pub use dlg_runtime::missing_participants;

#[derive(Debug, Clone, Default)]
pub struct LoadDialogueOptions {
    pub settings: DialogueSettings,
    pub catalog: ParticipantClassCatalog,
}

#[derive(Debug, Clone)]
pub struct LoadedDialogue {
    pub dialogue: Arc<Dialogue>,
    /// Aggregation diagnostics from the refresh pass.
    pub diagnostics: Vec<Diagnostic>,
    /// True when the file lacked GUIDs and fresh ones were generated for this load only.
    pub generated_guids: bool,
}

#[derive(Clone)]
pub struct CreateContextFromJsonOptions {
    pub dialogue_json: String,
    pub load: LoadDialogueOptions,
    pub context: ContextOptions,
    pub start_index: Option<usize>,
    pub branch_tag: Option<String>,
}

#[derive(Clone)]
pub struct ResumeContextFromJsonOptions {
    pub dialogue_json: String,
    pub load: LoadDialogueOptions,
    pub context: ContextOptions,
    pub snapshot: ContextSnapshot,
}

pub fn load_dialogue_from_json(
    json: &str,
    options: &LoadDialogueOptions,
) -> Result<LoadedDialogue, DialogueError> {
    let mut dialogue: Dialogue = serde_json::from_str(json).map_err(|error| {
        DialogueError::new(
            "API_DIALOGUE_JSON",
            format!("Dialogue JSON is invalid: {}.", error),
        )
    })?;
    let generated_guids =
        dialogue.guid.is_nil() || dialogue.iter_all().any(|(_, node)| !node.has_guid());

    dialogue.finish_load()?;
    let diagnostics = dialogue.refresh(&options.settings, &options.catalog);

    Ok(LoadedDialogue {
        dialogue: Arc::new(dialogue),
        diagnostics,
        generated_guids,
    })
}

pub fn dialogue_to_json(dialogue: &Dialogue) -> Result<String, DialogueError> {
    serde_json::to_string_pretty(dialogue).map_err(|error| {
        DialogueError::new(
            "API_DIALOGUE_JSON",
            format!("Dialogue could not be serialized: {}.", error),
        )
    })
}

pub fn create_context_from_json(
    options: CreateContextFromJsonOptions,
) -> Result<DialogueContext, DialogueError> {
    let loaded = load_dialogue_from_json(&options.dialogue_json, &options.load)?;
    match options.branch_tag {
        Some(tag) => DialogueContext::start_with_branch_tag(loaded.dialogue, options.context, &tag),
        None => DialogueContext::start(loaded.dialogue, options.context, options.start_index),
    }
}

pub fn resume_context_from_json(
    options: ResumeContextFromJsonOptions,
) -> Result<DialogueContext, DialogueError> {
    let loaded = load_dialogue_from_json(&options.dialogue_json, &options.load)?;
    if loaded.generated_guids {
        return Err(DialogueError::new(
            "API_DIALOGUE_GUID_MISSING",
            "Dialogue JSON has nodes without GUIDs, so a snapshot cannot be matched to it.",
        ));
    }
    DialogueContext::resume(loaded.dialogue, options.context, options.snapshot)
}

/// Builds one in-memory participant per state entry, keyed by participant name.
pub fn memory_participants(
    states: &BTreeMap<String, MemoryState>,
) -> BTreeMap<String, Arc<MemoryParticipant>> {
    states
        .iter()
        .map(|(name, state)| {
            (
                name.clone(),
                Arc::new(MemoryParticipant::with_state(name.clone(), state.clone())),
            )
        })
        .collect()
}

pub fn participant_map(participants: &BTreeMap<String, Arc<MemoryParticipant>>) -> ParticipantMap {
    participants
        .iter()
        .map(|(name, participant)| {
            let participant: Arc<dyn DialogueParticipant> = participant.clone();
            (name.clone(), participant)
        })
        .collect()
}

pub fn participants_from_states(states: &BTreeMap<String, MemoryState>) -> ParticipantMap {
    participant_map(&memory_participants(states))
}
