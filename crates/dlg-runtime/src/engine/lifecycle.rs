use std::sync::Arc;

use dlg_core::{DialogueError, NodeKind};
use dlg_graph::{Dialogue, NodeRef};
use tracing::{info, warn};

use super::{ContextOptions, DialogueContext, NodeSet, ParticipantMap};

/// Aggregated participant names that have no bound participant object.
pub fn missing_participants(dialogue: &Dialogue, participants: &ParticipantMap) -> Vec<String> {
    dialogue
        .participant_names()
        .filter(|name| !participants.contains_key(*name))
        .map(str::to_string)
        .collect()
}

impl DialogueContext {
    /// Starts a session. Without `start_index` the start nodes are tried left to right,
    /// skipping those excluded from default start.
    pub fn start(
        dialogue: Arc<Dialogue>,
        options: ContextOptions,
        start_index: Option<usize>,
    ) -> Result<Self, DialogueError> {
        if dialogue.start_nodes().is_empty() {
            return Err(DialogueError::new(
                "CONTEXT_NO_START_NODE",
                format!("Dialogue \"{}\" has no start node.", dialogue.name),
            ));
        }
        let candidates = match start_index {
            Some(index) if index < dialogue.start_nodes().len() => vec![index],
            Some(index) => {
                return Err(DialogueError::new(
                    "CONTEXT_START_INDEX_INVALID",
                    format!(
                        "Start index {} is out of range ({} start nodes).",
                        index,
                        dialogue.start_nodes().len()
                    ),
                ))
            }
            None => dialogue
                .start_nodes()
                .iter()
                .enumerate()
                .filter(|(_, node)| {
                    !matches!(
                        node.kind,
                        NodeKind::Start {
                            exclude_from_default_start: true,
                            ..
                        }
                    )
                })
                .map(|(index, _)| index)
                .collect(),
        };

        let mut context = Self::prepare(dialogue, options);
        for start in candidates {
            if context.try_start_node(start) {
                return Ok(context);
            }
        }
        Err(DialogueError::new(
            "CONTEXT_NO_SATISFIED_START",
            format!(
                "No start node of dialogue \"{}\" has a satisfied path.",
                context.dialogue.name
            ),
        ))
    }

    pub fn start_with_branch_tag(
        dialogue: Arc<Dialogue>,
        options: ContextOptions,
        branch_tag: &str,
    ) -> Result<Self, DialogueError> {
        let index = dialogue
            .start_node_index_for_branch_tag(branch_tag)
            .ok_or_else(|| {
                DialogueError::new(
                    "CONTEXT_BRANCH_TAG_UNKNOWN",
                    format!(
                        "Dialogue \"{}\" has no start node tagged \"{}\".",
                        dialogue.name, branch_tag
                    ),
                )
            })?;
        Self::start(dialogue, options, Some(index))
    }

    /// Resumes at an arbitrary node. Without `fire_enter_events` the node is only
    /// made active and its options are evaluated.
    pub fn start_from_node(
        dialogue: Arc<Dialogue>,
        options: ContextOptions,
        node_index: usize,
        fire_enter_events: bool,
    ) -> Result<Self, DialogueError> {
        if !dialogue.is_valid_node_index(node_index) {
            return Err(DialogueError::at_node(
                "CONTEXT_NODE_INDEX_INVALID",
                format!(
                    "Node index {} is out of range ({} nodes).",
                    node_index,
                    dialogue.nodes().len()
                ),
                node_index,
            ));
        }
        let mut context = Self::prepare(dialogue, options);
        let continues = if fire_enter_events {
            context.enter_node(node_index, NodeSet::new())
        } else {
            context.activate_without_events(node_index)
        };
        if !continues {
            context.end_session();
        }
        Ok(context)
    }

    fn prepare(dialogue: Arc<Dialogue>, options: ContextOptions) -> Self {
        for name in missing_participants(&dialogue, &options.participants) {
            warn!(participant = %name, dialogue = %dialogue.name, "participant is not bound");
        }
        info!(dialogue = %dialogue.name, "starting dialogue session");
        Self::empty(dialogue, options)
    }

    /// Takes the first satisfied edge of a start node that passes its own enter conditions.
    fn try_start_node(&mut self, start: usize) -> bool {
        let dialogue = Arc::clone(&self.dialogue);
        let start_ref = NodeRef::Start(start);
        let Some(node) = dialogue.resolve(start_ref) else {
            return false;
        };
        if !self.check_node_enter_conditions(start_ref, NodeSet::new()) {
            return false;
        }
        let Some(edge) = node
            .children
            .iter()
            .find(|edge| self.evaluate_edge(node, edge, NodeSet::new()))
        else {
            return false;
        };

        self.fire_events(&node.enter_events, node);
        self.fire_events(&edge.events, node);
        if !self.enter_node(edge.target_index, NodeSet::new()) {
            self.end_session();
        }
        true
    }

    pub(crate) fn activate_without_events(&mut self, node_index: usize) -> bool {
        let dialogue = Arc::clone(&self.dialogue);
        let Some(node) = dialogue.node(node_index) else {
            return false;
        };
        self.active_node = Some(node_index);
        self.active_text = self.construct_text(node.text(), node.text_arguments(), node);
        if let NodeKind::End(end) = &node.kind {
            self.end_outcome = Some(super::EndOutcome {
                node_index,
                return_to_main_on_end: end.return_to_main_on_end,
                transition: end.transition.clone(),
            });
            return false;
        }
        self.reevaluate_children(NodeRef::Regular(node_index), NodeSet::new())
    }
}
