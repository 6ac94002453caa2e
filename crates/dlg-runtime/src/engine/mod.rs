use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use dlg_core::{AnswerIntend, DialogueTransition};
use dlg_graph::{Dialogue, NodeRef};
use serde::{Deserialize, Serialize};

use crate::custom::CustomRegistry;
use crate::format::{BraceTextFormatter, TextFormatter};
use crate::history::{DialogueMemory, NodeHistory, SharedMemory};
use crate::participant::DialogueParticipant;

mod evaluate;
mod lifecycle;
mod rng;
mod snapshot;
mod traversal;

pub use lifecycle::missing_participants;
pub use snapshot::{ContextSnapshot, SNAPSHOT_SCHEMA};

/// Cycle guard threaded through recursive evaluation and entry.
pub(crate) type NodeSet = BTreeSet<NodeRef>;

pub type ParticipantMap = BTreeMap<String, Arc<dyn DialogueParticipant>>;

#[derive(Clone, Default)]
pub struct ContextOptions {
    pub participants: ParticipantMap,
    pub custom: CustomRegistry,
    /// Cloned options keep pointing at the same memory.
    pub memory: SharedMemory,
    pub text_formatter: Option<Arc<dyn TextFormatter>>,
    pub random_seed: Option<u32>,
}

impl ContextOptions {
    pub fn with_participant(mut self, participant: Arc<dyn DialogueParticipant>) -> Self {
        self.participants
            .insert(participant.participant_name().to_string(), participant);
        self
    }
}

impl fmt::Debug for ContextOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextOptions")
            .field("participants", &self.participants.keys().collect::<Vec<_>>())
            .field("custom", &self.custom)
            .field("memory", &self.memory)
            .field("random_seed", &self.random_seed)
            .finish()
    }
}

/// One selectable (or, in `all_options`, possibly disabled) outgoing edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextOption {
    /// Node owning the edge. Differs from the active node behind a virtual parent.
    pub source: NodeRef,
    pub edge_index: usize,
    pub target_index: usize,
    pub satisfied: bool,
    pub text: String,
    pub speaker_state: String,
    pub intend: AnswerIntend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndOutcome {
    pub node_index: usize,
    pub return_to_main_on_end: Option<bool>,
    pub transition: Option<DialogueTransition>,
}

/// Per-session state walking a shared, read-only dialogue.
pub struct DialogueContext {
    dialogue: Arc<Dialogue>,
    participants: ParticipantMap,
    custom: CustomRegistry,
    text_formatter: Arc<dyn TextFormatter>,
    memory: SharedMemory,
    history: NodeHistory,
    active_node: Option<usize>,
    active_text: String,
    current_options: Vec<ContextOption>,
    all_options: Vec<ContextOption>,
    ended: bool,
    end_outcome: Option<EndOutcome>,
    rng_state: u32,
}

impl DialogueContext {
    fn empty(dialogue: Arc<Dialogue>, options: ContextOptions) -> Self {
        Self {
            dialogue,
            participants: options.participants,
            custom: options.custom,
            text_formatter: options
                .text_formatter
                .unwrap_or_else(|| Arc::new(BraceTextFormatter)),
            memory: options.memory,
            history: NodeHistory::default(),
            active_node: None,
            active_text: String::new(),
            current_options: Vec::new(),
            all_options: Vec::new(),
            ended: false,
            end_outcome: None,
            rng_state: options.random_seed.unwrap_or(1),
        }
    }

    pub fn dialogue(&self) -> &Arc<Dialogue> {
        &self.dialogue
    }

    pub fn participant(&self, name: &str) -> Option<&Arc<dyn DialogueParticipant>> {
        self.participants.get(name)
    }

    pub fn active_node_index(&self) -> Option<usize> {
        self.active_node
    }

    pub fn active_node(&self) -> Option<&dlg_core::Node> {
        self.active_node.and_then(|index| self.dialogue.node(index))
    }

    /// Text of the active node with its text arguments applied.
    pub fn active_text(&self) -> &str {
        &self.active_text
    }

    pub fn active_participant_name(&self) -> &str {
        self.active_node()
            .map(|node| node.participant_name.as_str())
            .unwrap_or("")
    }

    pub fn active_speaker_state(&self) -> &str {
        self.active_node()
            .map(|node| node.speaker_state())
            .unwrap_or("")
    }

    pub fn current_options(&self) -> &[ContextOption] {
        &self.current_options
    }

    pub fn all_options(&self) -> &[ContextOption] {
        &self.all_options
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn end_outcome(&self) -> Option<&EndOutcome> {
        self.end_outcome.as_ref()
    }

    pub fn history(&self) -> &NodeHistory {
        &self.history
    }

    pub fn memory(&self) -> &SharedMemory {
        &self.memory
    }

    pub fn into_memory(self) -> DialogueMemory {
        self.memory.to_memory()
    }

    pub fn was_node_visited(&self, node_index: usize) -> bool {
        let guid = self.dialogue.get_node_guid_for_index(node_index).unwrap_or_default();
        self.history.contains(node_index, guid)
    }
}

#[cfg(test)]
mod tests;
