use std::sync::Arc;

use dlg_core::{DialogueError, Uuid};
use dlg_graph::Dialogue;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ContextOptions, DialogueContext};
use crate::history::{DialogueMemory, NodeHistory};

pub const SNAPSHOT_SCHEMA: &str = "dlg-snapshot.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub schema_version: String,
    pub dialogue_guid: Uuid,
    pub active_node_index: Option<usize>,
    /// Preferred over the index when resolving the active node.
    pub active_node_guid: Option<Uuid>,
    pub history: NodeHistory,
    pub memory: DialogueMemory,
    pub rng_state: u32,
    pub ended: bool,
}

impl DialogueContext {
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            schema_version: SNAPSHOT_SCHEMA.to_string(),
            dialogue_guid: self.dialogue.guid,
            active_node_index: self.active_node,
            active_node_guid: self
                .active_node
                .and_then(|index| self.dialogue.get_node_guid_for_index(index)),
            history: self.history.clone(),
            memory: self.memory.to_memory(),
            rng_state: self.rng_state,
            ended: self.ended,
        }
    }

    /// Rebuilds a session from a snapshot. Enter events are not replayed and the
    /// snapshot's memory is merged into the shared memory in `options`.
    pub fn resume(
        dialogue: Arc<Dialogue>,
        options: ContextOptions,
        snapshot: ContextSnapshot,
    ) -> Result<Self, DialogueError> {
        if snapshot.schema_version != SNAPSHOT_SCHEMA {
            return Err(DialogueError::new(
                "CONTEXT_SNAPSHOT_SCHEMA",
                format!(
                    "Unsupported snapshot schema \"{}\".",
                    snapshot.schema_version
                ),
            ));
        }
        if snapshot.dialogue_guid != dialogue.guid {
            return Err(DialogueError::new(
                "CONTEXT_SNAPSHOT_DIALOGUE",
                format!(
                    "Snapshot belongs to dialogue {} but \"{}\" is {}.",
                    snapshot.dialogue_guid, dialogue.name, dialogue.guid
                ),
            ));
        }

        let active_node = match (snapshot.active_node_guid, snapshot.active_node_index) {
            (Some(guid), _) => Some(dialogue.get_node_index_for_guid(&guid).ok_or_else(|| {
                DialogueError::new(
                    "CONTEXT_SNAPSHOT_NODE",
                    format!("Snapshot active node {} no longer exists.", guid),
                )
            })?),
            (None, Some(index)) if dialogue.is_valid_node_index(index) => Some(index),
            (None, Some(index)) => {
                return Err(DialogueError::at_node(
                    "CONTEXT_SNAPSHOT_NODE",
                    format!("Snapshot active node index {} is out of range.", index),
                    index,
                ))
            }
            (None, None) => None,
        };

        let mut context = Self::empty(dialogue, options);
        context.history = snapshot.history;
        context.memory.merge(&snapshot.memory);
        context.rng_state = snapshot.rng_state;

        let Some(index) = active_node else {
            context.ended = true;
            return Ok(context);
        };
        debug!(node = index, ended = snapshot.ended, "resuming dialogue session");
        let continues = context.activate_without_events(index);
        if snapshot.ended || !continues {
            context.end_session();
        }
        Ok(context)
    }
}
