use std::collections::HashMap;

use dlg_core::{Condition, ConditionKind, Event, EventKind, Node, NodeKind, TextArgument, TextArgumentKind, Uuid};

use crate::dialogue::{Dialogue, NodeRef};
use crate::diagnostics::Diagnostic;
use crate::participants::ParticipantClassCatalog;

pub const PROXY_TARGET_INVALID: &str = "DIALOGUE_PROXY_TARGET_INVALID";
pub const EDGE_TARGET_INVALID: &str = "DIALOGUE_EDGE_TARGET_INVALID";
pub const CUSTOM_HANDLER_MISSING: &str = "DIALOGUE_CUSTOM_HANDLER_MISSING";
pub const CLASS_PROPERTY_MISSING: &str = "DIALOGUE_CLASS_PROPERTY_MISSING";
pub const GUID_DUPLICATE: &str = "DIALOGUE_GUID_DUPLICATE";
pub const GUID_NIL: &str = "DIALOGUE_GUID_NIL";

/// Authoring checks. Never mutates the dialogue.
pub fn validate(dialogue: &Dialogue, catalog: &ParticipantClassCatalog) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let node_count = dialogue.nodes().len();
    let mut seen_guids: HashMap<Uuid, NodeRef> = HashMap::new();

    for (node_ref, node) in dialogue.iter_all() {
        if node.guid.is_nil() {
            diagnostics.push(
                Diagnostic::warning(GUID_NIL, format!("{} has no GUID.", node_ref.label()))
                    .at(node_ref, node.guid),
            );
        } else if let Some(first) = seen_guids.insert(node.guid, node_ref) {
            diagnostics.push(
                Diagnostic::warning(
                    GUID_DUPLICATE,
                    format!(
                        "{} reuses GUID {} already used by {}.",
                        node_ref.label(),
                        node.guid,
                        first.label()
                    ),
                )
                .at(node_ref, node.guid),
            );
        }

        if let NodeKind::Proxy { target_index } = node.kind {
            if target_index >= node_count {
                diagnostics.push(
                    Diagnostic::error(
                        PROXY_TARGET_INVALID,
                        format!(
                            "Proxy targets index {} but the dialogue has {} nodes.",
                            target_index, node_count
                        ),
                    )
                    .at(node_ref, node.guid),
                );
            }
        }

        let checker = NodeChecker {
            dialogue,
            catalog,
            node_ref,
            node,
        };
        checker.check_conditions(&node.enter_conditions, &mut diagnostics);
        checker.check_events(&node.enter_events, &mut diagnostics);
        checker.check_text_arguments(node.text_arguments(), &mut diagnostics);

        for edge in &node.children {
            if edge.target_index >= node_count {
                diagnostics.push(
                    Diagnostic::error(
                        EDGE_TARGET_INVALID,
                        format!(
                            "Edge targets index {} but the dialogue has {} nodes.",
                            edge.target_index, node_count
                        ),
                    )
                    .at(node_ref, node.guid),
                );
            }
            checker.check_conditions(&edge.conditions, &mut diagnostics);
            checker.check_events(&edge.events, &mut diagnostics);
            checker.check_text_arguments(&edge.text_arguments, &mut diagnostics);
        }
    }

    diagnostics
}

struct NodeChecker<'a> {
    dialogue: &'a Dialogue,
    catalog: &'a ParticipantClassCatalog,
    node_ref: NodeRef,
    node: &'a Node,
}

impl NodeChecker<'_> {
    fn participant<'n>(&'n self, name: &'n str) -> &'n str {
        if name.is_empty() {
            &self.node.participant_name
        } else {
            name
        }
    }

    fn missing_handler(&self, what: &str, out: &mut Vec<Diagnostic>) {
        out.push(
            Diagnostic::warning(
                CUSTOM_HANDLER_MISSING,
                format!("Custom {} has no handler id.", what),
            )
            .at(self.node_ref, self.node.guid),
        );
    }

    fn check_class_property(&self, participant: &str, property: &str, out: &mut Vec<Diagnostic>) {
        let Some(class_name) = self.dialogue.participant_class(participant) else {
            return;
        };
        let declared = self
            .catalog
            .class(class_name)
            .is_some_and(|class| class.has_property(property));
        if !declared {
            out.push(
                Diagnostic::warning(
                    CLASS_PROPERTY_MISSING,
                    format!(
                        "Class \"{}\" bound to participant \"{}\" does not declare property \"{}\".",
                        class_name, participant, property
                    ),
                )
                .at(self.node_ref, self.node.guid),
            );
        }
    }

    fn check_conditions(&self, conditions: &[Condition], out: &mut Vec<Diagnostic>) {
        for condition in conditions {
            match condition.kind {
                ConditionKind::Custom if condition.custom.is_none() => {
                    self.missing_handler("condition", out)
                }
                kind if kind.is_class_variable() => {
                    let participant = self.participant(&condition.participant_name);
                    self.check_class_property(participant, &condition.callback_name, out);
                }
                _ => {}
            }
        }
    }

    fn check_events(&self, events: &[Event], out: &mut Vec<Diagnostic>) {
        for event in events {
            match event.kind {
                EventKind::Custom if event.custom.is_none() => self.missing_handler("event", out),
                kind if kind.is_class_variable() => {
                    let participant = self.participant(&event.participant_name);
                    self.check_class_property(participant, &event.event_name, out);
                }
                _ => {}
            }
        }
    }

    fn check_text_arguments(&self, arguments: &[TextArgument], out: &mut Vec<Diagnostic>) {
        for argument in arguments {
            match argument.kind {
                TextArgumentKind::Custom if argument.custom.is_none() => {
                    self.missing_handler("text argument", out)
                }
                TextArgumentKind::ClassInt
                | TextArgumentKind::ClassFloat
                | TextArgumentKind::ClassText => {
                    let participant = self.participant(&argument.participant_name);
                    self.check_class_property(participant, &argument.variable_name, out);
                }
                _ => {}
            }
        }
    }
}
