use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dlg_core::Uuid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub node_index: usize,
    pub guid: Uuid,
}

/// Insertion-ordered set of visited nodes. Keyed by GUID, by index when the GUID is nil.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHistory {
    entries: Vec<HistoryEntry>,
}

impl NodeHistory {
    pub fn add(&mut self, node_index: usize, guid: Uuid) -> bool {
        if self.contains(node_index, guid) {
            return false;
        }
        self.entries.push(HistoryEntry { node_index, guid });
        true
    }

    pub fn contains(&self, node_index: usize, guid: Uuid) -> bool {
        if guid.is_nil() {
            self.entries
                .iter()
                .any(|entry| entry.guid.is_nil() && entry.node_index == node_index)
        } else {
            self.contains_guid(&guid)
        }
    }

    pub fn contains_guid(&self, guid: &Uuid) -> bool {
        !guid.is_nil() && self.entries.iter().any(|entry| &entry.guid == guid)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Long-term history shared by every session, keyed by dialogue GUID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogueMemory {
    histories: BTreeMap<Uuid, NodeHistory>,
}

impl DialogueMemory {
    pub fn history(&self, dialogue_guid: &Uuid) -> Option<&NodeHistory> {
        self.histories.get(dialogue_guid)
    }

    pub fn set_node_visited(&mut self, dialogue_guid: Uuid, node_index: usize, guid: Uuid) {
        self.histories
            .entry(dialogue_guid)
            .or_default()
            .add(node_index, guid);
    }

    pub fn is_node_visited(&self, dialogue_guid: &Uuid, node_index: usize, guid: Uuid) -> bool {
        self.histories
            .get(dialogue_guid)
            .map(|history| history.contains(node_index, guid))
            .unwrap_or(false)
    }

    /// Adds every visit recorded in `other`; existing entries keep their order.
    pub fn merge(&mut self, other: &DialogueMemory) {
        for (dialogue_guid, history) in &other.histories {
            let target = self.histories.entry(*dialogue_guid).or_default();
            for entry in history.entries() {
                target.add(entry.node_index, entry.guid);
            }
        }
    }

    pub fn forget(&mut self, dialogue_guid: &Uuid) {
        self.histories.remove(dialogue_guid);
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

/// Handle to one `DialogueMemory` shared by every context of the same game
/// state, so `Once` nodes stay closed for sessions running side by side.
#[derive(Debug, Clone, Default)]
pub struct SharedMemory(Arc<Mutex<DialogueMemory>>);

impl SharedMemory {
    pub fn new(memory: DialogueMemory) -> Self {
        Self(Arc::new(Mutex::new(memory)))
    }

    pub fn set_node_visited(&self, dialogue_guid: Uuid, node_index: usize, guid: Uuid) {
        self.lock().set_node_visited(dialogue_guid, node_index, guid);
    }

    pub fn is_node_visited(&self, dialogue_guid: &Uuid, node_index: usize, guid: Uuid) -> bool {
        self.lock().is_node_visited(dialogue_guid, node_index, guid)
    }

    pub fn merge(&self, other: &DialogueMemory) {
        self.lock().merge(other);
    }

    /// Copy of the current contents.
    pub fn to_memory(&self) -> DialogueMemory {
        self.lock().clone()
    }

    pub fn shares_with(&self, other: &SharedMemory) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn lock(&self) -> MutexGuard<'_, DialogueMemory> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<DialogueMemory> for SharedMemory {
    fn from(memory: DialogueMemory) -> Self {
        Self::new(memory)
    }
}
