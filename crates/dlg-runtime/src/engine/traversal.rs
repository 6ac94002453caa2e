use std::sync::Arc;

use dlg_core::{DialogueError, Node, NodeKind, SelectorType};
use dlg_graph::NodeRef;
use tracing::{debug, error, info};

use super::rng::random_index;
use super::{ContextOption, DialogueContext, EndOutcome, NodeSet};

impl DialogueContext {
    /// Makes `index` the active node, records it and runs its entry behavior.
    /// Returns false when the session cannot continue from there.
    pub(crate) fn enter_node(&mut self, index: usize, entered: NodeSet) -> bool {
        let dialogue = Arc::clone(&self.dialogue);
        let Some(node) = dialogue.node(index) else {
            error!(index, "cannot enter node: index out of range");
            return false;
        };
        debug!(node = index, node_type = node.type_name(), "entering node");
        self.active_node = Some(index);
        self.active_text.clear();
        self.record_visit(index, node);
        self.handle_node_enter(NodeRef::Regular(index), node, entered)
    }

    fn record_visit(&mut self, index: usize, node: &Node) {
        self.history.add(index, node.guid);
        self.memory
            .set_node_visited(self.dialogue.guid, index, node.guid);
    }

    fn handle_node_enter(&mut self, node_ref: NodeRef, node: &Node, mut entered: NodeSet) -> bool {
        match &node.kind {
            NodeKind::End(end) => {
                self.fire_events(&node.enter_events, node);
                self.end_outcome = Some(EndOutcome {
                    node_index: node_ref.regular_index().unwrap_or_default(),
                    return_to_main_on_end: end.return_to_main_on_end,
                    transition: end.transition.clone(),
                });
                false
            }
            NodeKind::Proxy { target_index } => {
                if !entered.insert(node_ref) {
                    error!(node = %node_ref.label(), "proxy cycle detected, aborting");
                    return false;
                }
                self.fire_events(&node.enter_events, node);
                self.enter_node(*target_index, entered)
            }
            NodeKind::Selector { selector_type } => {
                let selector_type = *selector_type;
                self.auto_advance(node_ref, node, entered, selector_type)
            }
            NodeKind::Start { .. } => self.auto_advance(node_ref, node, entered, SelectorType::First),
            NodeKind::Speech(speech) if speech.is_virtual_parent => {
                self.auto_advance(node_ref, node, entered, SelectorType::First)
            }
            NodeKind::Speech(speech) => {
                self.fire_events(&node.enter_events, node);
                self.active_text = self.construct_text(&speech.text, &speech.text_arguments, node);
                self.reevaluate_children(node_ref, NodeSet::new())
            }
        }
    }

    /// Virtual parents and selectors never wait for the driver: they fire their
    /// events and immediately enter one satisfied child.
    fn auto_advance(
        &mut self,
        node_ref: NodeRef,
        node: &Node,
        mut entered: NodeSet,
        selector_type: SelectorType,
    ) -> bool {
        if !entered.insert(node_ref) {
            error!(
                node = %node_ref.label(),
                "reentrant auto-advance detected, node would become its own ancestor"
            );
            return false;
        }
        self.fire_events(&node.enter_events, node);

        let satisfied = node
            .children
            .iter()
            .enumerate()
            .filter(|(_, edge)| self.evaluate_edge(node, edge, NodeSet::from([node_ref])))
            .map(|(edge_index, _)| edge_index)
            .collect::<Vec<_>>();
        let chosen = match (selector_type, satisfied.len()) {
            (_, 0) => None,
            (SelectorType::First, _) => satisfied.first().copied(),
            (SelectorType::Random, len) => satisfied.get(random_index(&mut self.rng_state, len)).copied(),
        };
        let Some(edge_index) = chosen else {
            debug!(node = %node_ref.label(), "auto-advance found no satisfied child");
            return false;
        };

        let edge = &node.children[edge_index];
        self.fire_events(&edge.events, node);
        self.enter_node(edge.target_index, entered)
    }

    /// Rebuilds `current_options`/`all_options` for `node_ref`.
    /// Virtual parents expose the options of their first satisfied descendant.
    pub(crate) fn reevaluate_children(&mut self, node_ref: NodeRef, mut evaluated: NodeSet) -> bool {
        self.current_options.clear();
        self.all_options.clear();

        let dialogue = Arc::clone(&self.dialogue);
        let Some(node) = dialogue.resolve(node_ref) else {
            return false;
        };
        if node.is_end() {
            return false;
        }

        if node.is_virtual_parent() {
            if !evaluated.insert(node_ref) {
                error!(
                    node = %node_ref.label(),
                    "virtual parent reached twice while re-evaluating, ending session"
                );
                return false;
            }
            let first = node
                .children
                .iter()
                .find(|edge| self.evaluate_edge(node, edge, NodeSet::from([node_ref])));
            return match first {
                Some(edge) => self.reevaluate_children(NodeRef::Regular(edge.target_index), evaluated),
                None => false,
            };
        }

        for (edge_index, edge) in node.children.iter().enumerate() {
            let satisfied = self.evaluate_edge(node, edge, NodeSet::from([node_ref]));
            if !satisfied && !edge.include_in_all_options_if_unsatisfied {
                continue;
            }
            let option = ContextOption {
                source: node_ref,
                edge_index,
                target_index: edge.target_index,
                satisfied,
                text: self.construct_text(&edge.text, &edge.text_arguments, node),
                speaker_state: edge.speaker_state.clone(),
                intend: edge.intend,
            };
            if satisfied {
                self.current_options.push(option.clone());
            }
            self.all_options.push(option);
        }
        !self.current_options.is_empty()
    }

    /// Selects a satisfied option by its index in `current_options`.
    pub fn choose_option(&mut self, index: usize) -> Result<(), DialogueError> {
        self.ensure_running()?;
        let option = self.current_options.get(index).cloned().ok_or_else(|| {
            DialogueError::new(
                "CONTEXT_OPTION_INDEX",
                format!(
                    "Option index {} is out of range ({} options available).",
                    index,
                    self.current_options.len()
                ),
            )
        })?;
        self.select_option(option);
        Ok(())
    }

    /// Selects by index in `all_options`. Disabled (unsatisfied) options are rejected.
    pub fn choose_option_from_all(&mut self, index: usize) -> Result<(), DialogueError> {
        self.ensure_running()?;
        let option = self.all_options.get(index).cloned().ok_or_else(|| {
            DialogueError::new(
                "CONTEXT_OPTION_INDEX",
                format!(
                    "Option index {} is out of range ({} options in total).",
                    index,
                    self.all_options.len()
                ),
            )
        })?;
        if !option.satisfied {
            return Err(DialogueError::new(
                "CONTEXT_OPTION_UNSATISFIED",
                format!("Option {} is not satisfied and cannot be selected.", index),
            ));
        }
        self.select_option(option);
        Ok(())
    }

    fn select_option(&mut self, option: ContextOption) {
        let dialogue = Arc::clone(&self.dialogue);
        let Some(owner) = dialogue.resolve(option.source) else {
            self.end_session();
            return;
        };
        let Some(edge) = owner.children.get(option.edge_index) else {
            self.end_session();
            return;
        };
        info!(
            from = %option.source.label(),
            to = edge.target_index,
            "option selected"
        );
        self.fire_events(&edge.events, owner);
        if !self.enter_node(edge.target_index, NodeSet::new()) {
            self.end_session();
        }
    }

    /// Recomputes the options of the active node, e.g. after participant state changed
    /// outside the dialogue. Ends the session when nothing is selectable anymore.
    pub fn reevaluate_options(&mut self) -> bool {
        if self.ended {
            return false;
        }
        let Some(index) = self.active_node else {
            return false;
        };
        let continues = self.reevaluate_children(NodeRef::Regular(index), NodeSet::new());
        if !continues {
            self.end_session();
        }
        continues
    }

    pub(crate) fn end_session(&mut self) {
        if !self.ended {
            info!(dialogue = %self.dialogue.name, "dialogue session ended");
        }
        self.ended = true;
        self.current_options.clear();
        self.all_options.clear();
    }

    fn ensure_running(&self) -> Result<(), DialogueError> {
        if self.ended {
            return Err(DialogueError::new(
                "CONTEXT_ENDED",
                "The dialogue session has already ended.",
            ));
        }
        Ok(())
    }
}
