use std::collections::{BTreeSet, HashMap};

use dlg_core::{DialogueError, Node, NodeKind, Uuid};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::ParticipantData;
use crate::participants::ParticipantClassBinding;

/// Addresses either an entry in `start_nodes` or one in `nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "camelCase")]
pub enum NodeRef {
    Start(usize),
    Regular(usize),
}

impl NodeRef {
    pub fn label(self) -> String {
        match self {
            Self::Start(index) => format!("start node {}", index),
            Self::Regular(index) => format!("node {}", index),
        }
    }

    pub fn regular_index(self) -> Option<usize> {
        match self {
            Self::Regular(index) => Some(index),
            Self::Start(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialogue {
    #[serde(default)]
    pub guid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    start_nodes: Vec<Node>,
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(skip)]
    guid_to_index: HashMap<Uuid, usize>,
    #[serde(default)]
    pub(crate) participants_data: IndexMap<String, ParticipantData>,
    #[serde(default)]
    pub(crate) speaker_states: BTreeSet<String>,
    #[serde(default)]
    pub(crate) participant_classes: Vec<ParticipantClassBinding>,
}

impl Dialogue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builds a dialogue from raw parts and runs the load pass on it.
    pub fn from_parts(
        name: impl Into<String>,
        start_nodes: Vec<Node>,
        nodes: Vec<Node>,
    ) -> Result<Self, DialogueError> {
        let mut dialogue = Self::new(name);
        dialogue.start_nodes = start_nodes;
        dialogue.nodes = nodes;
        dialogue.finish_load()?;
        Ok(dialogue)
    }

    /// Post-deserialization pass: default start node, GUIDs, GUID map, integrity.
    pub fn finish_load(&mut self) -> Result<(), DialogueError> {
        if self.guid.is_nil() {
            self.guid = Uuid::new_v4();
        }
        if self.start_nodes.is_empty() {
            warn!(dialogue = %self.name, "dialogue has no start node, adding an empty one");
            self.start_nodes.push(Node::start());
        }
        let generated = self.ensure_guids();
        if generated > 0 {
            debug!(dialogue = %self.name, generated, "generated missing node guids");
        }
        self.rebuild_guid_map();
        self.check_integrity()
    }

    /// Assigns a fresh v4 GUID to every node that carries the nil GUID.
    pub fn ensure_guids(&mut self) -> usize {
        let mut generated = 0;
        for node in self.start_nodes.iter_mut().chain(self.nodes.iter_mut()) {
            if !node.has_guid() {
                node.guid = Uuid::new_v4();
                generated += 1;
            }
        }
        if generated > 0 {
            self.rebuild_guid_map();
        }
        generated
    }

    /// Fails on the first edge or proxy pointing outside `nodes`.
    pub fn check_integrity(&self) -> Result<(), DialogueError> {
        let node_count = self.nodes.len();
        for (node_ref, node) in self.iter_all() {
            for (edge_index, edge) in node.children.iter().enumerate() {
                if edge.target_index >= node_count {
                    return Err(DialogueError::new(
                        "DIALOGUE_EDGE_TARGET_INVALID",
                        format!(
                            "Edge {} of {} in dialogue \"{}\" targets index {} but the dialogue has {} nodes.",
                            edge_index,
                            node_ref.label(),
                            self.name,
                            edge.target_index,
                            node_count
                        ),
                    )
                    .with_node(node_ref.regular_index()));
                }
            }
            if let NodeKind::Proxy { target_index } = node.kind {
                if target_index >= node_count {
                    return Err(DialogueError::new(
                        "DIALOGUE_PROXY_TARGET_INVALID",
                        format!(
                            "Proxy {} in dialogue \"{}\" targets index {} but the dialogue has {} nodes.",
                            node_ref.label(),
                            self.name,
                            target_index,
                            node_count
                        ),
                    )
                    .with_node(node_ref.regular_index()));
                }
            }
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn start_nodes(&self) -> &[Node] {
        &self.start_nodes
    }

    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
        self.rebuild_guid_map();
    }

    pub fn set_start_nodes(&mut self, start_nodes: Vec<Node>) {
        self.start_nodes = start_nodes;
    }

    /// Replaces a single node in place. Stale indices are ignored.
    pub fn set_node(&mut self, index: usize, node: Node) -> bool {
        let Some(slot) = self.nodes.get_mut(index) else {
            debug!(index, "set_node ignored: index out of range");
            return false;
        };
        let previous_guid = slot.guid;
        *slot = node;
        let new_guid = slot.guid;

        if self.guid_to_index.get(&previous_guid) == Some(&index) {
            self.guid_to_index.remove(&previous_guid);
        }
        if !new_guid.is_nil() {
            self.guid_to_index.insert(new_guid, index);
        }
        true
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Mutable access for in-place edits. GUID changes must go through `set_node`.
    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    pub fn resolve(&self, node_ref: NodeRef) -> Option<&Node> {
        match node_ref {
            NodeRef::Start(index) => self.start_nodes.get(index),
            NodeRef::Regular(index) => self.nodes.get(index),
        }
    }

    /// Start nodes first, then regular nodes, both in array order.
    pub fn iter_all(&self) -> impl Iterator<Item = (NodeRef, &Node)> {
        self.start_nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeRef::Start(index), node))
            .chain(
                self.nodes
                    .iter()
                    .enumerate()
                    .map(|(index, node)| (NodeRef::Regular(index), node)),
            )
    }

    pub fn is_valid_node_index(&self, index: usize) -> bool {
        index < self.nodes.len()
    }

    pub fn is_end_node(&self, index: usize) -> bool {
        self.nodes.get(index).is_some_and(Node::is_end)
    }

    pub fn get_node_index_for_guid(&self, guid: &Uuid) -> Option<usize> {
        self.guid_to_index.get(guid).copied()
    }

    pub fn get_node_guid_for_index(&self, index: usize) -> Option<Uuid> {
        self.nodes
            .get(index)
            .map(|node| node.guid)
            .filter(|guid| !guid.is_nil())
    }

    /// Finds a node in either list by GUID.
    pub fn find_by_guid(&self, guid: &Uuid) -> Option<NodeRef> {
        if guid.is_nil() {
            return None;
        }
        if let Some(index) = self.get_node_index_for_guid(guid) {
            return Some(NodeRef::Regular(index));
        }
        self.start_nodes
            .iter()
            .position(|node| &node.guid == guid)
            .map(NodeRef::Start)
    }

    pub fn start_node_index_for_branch_tag(&self, branch_tag: &str) -> Option<usize> {
        self.start_nodes.iter().position(|node| {
            matches!(&node.kind, NodeKind::Start { branch_tag: tag, .. } if tag == branch_tag)
        })
    }

    pub fn participants_data(&self) -> &IndexMap<String, ParticipantData> {
        &self.participants_data
    }

    pub fn participant_names(&self) -> impl Iterator<Item = &str> {
        self.participants_data.keys().map(String::as_str)
    }

    pub fn speaker_states(&self) -> &BTreeSet<String> {
        &self.speaker_states
    }

    pub fn participant_classes(&self) -> &[ParticipantClassBinding] {
        &self.participant_classes
    }

    pub fn participant_class(&self, participant_name: &str) -> Option<&str> {
        self.participant_classes
            .iter()
            .find(|binding| binding.participant_name == participant_name)
            .and_then(|binding| binding.class_name.as_deref())
    }

    /// Manually binds a class to a participant. Returns false for unknown participants.
    pub fn bind_participant_class(&mut self, participant_name: &str, class_name: &str) -> bool {
        match self
            .participant_classes
            .iter_mut()
            .find(|binding| binding.participant_name == participant_name)
        {
            Some(binding) => {
                binding.class_name = Some(class_name.to_string());
                true
            }
            None => false,
        }
    }

    fn rebuild_guid_map(&mut self) {
        self.guid_to_index = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.has_guid())
            .map(|(index, node)| (node.guid, index))
            .collect();
    }
}
