use std::collections::{BTreeMap, BTreeSet};

use dlg_core::{Condition, ConditionKind, Event, EventKind, Node, TextArgument, TextArgumentKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dialogue::{Dialogue, NodeRef};
use crate::diagnostics::Diagnostic;
use crate::participants::{ParticipantClassBinding, ParticipantClassCatalog};
use crate::settings::DialogueSettings;

pub const PARTICIPANT_UNRESOLVED: &str = "DIALOGUE_PARTICIPANT_UNRESOLVED";

/// Capabilities a participant is expected to expose, collected over the whole graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticipantData {
    pub conditions: BTreeMap<ConditionKind, BTreeSet<String>>,
    /// Values read from this participant on behalf of another participant's condition.
    pub secondary_conditions: BTreeMap<ConditionKind, BTreeSet<String>>,
    pub events: BTreeMap<EventKind, BTreeSet<String>>,
    pub text_arguments: BTreeMap<TextArgumentKind, BTreeSet<String>>,
    pub custom_conditions: BTreeSet<String>,
    pub custom_events: BTreeSet<String>,
    pub custom_text_arguments: BTreeSet<String>,
}

impl ParticipantData {
    pub fn add_condition_primary(&mut self, condition: &Condition) {
        match condition.kind {
            ConditionKind::Custom => {
                if let Some(custom) = &condition.custom {
                    self.custom_conditions.insert(custom.clone());
                }
            }
            ConditionKind::WasNodeVisited | ConditionKind::HasSatisfiedChild => {}
            kind => insert_name(&mut self.conditions, kind, &condition.callback_name),
        }
    }

    pub fn add_condition_secondary(&mut self, condition: &Condition) {
        if condition.is_second_participant_involved() {
            insert_name(
                &mut self.secondary_conditions,
                condition.kind,
                &condition.other_variable_name,
            );
        }
    }

    pub fn add_event(&mut self, event: &Event) {
        match event.kind {
            EventKind::Custom => {
                if let Some(custom) = &event.custom {
                    self.custom_events.insert(custom.clone());
                }
            }
            kind => insert_name(&mut self.events, kind, &event.event_name),
        }
    }

    pub fn add_text_argument(&mut self, argument: &TextArgument) {
        match argument.kind {
            TextArgumentKind::Custom => {
                if let Some(custom) = &argument.custom {
                    self.custom_text_arguments.insert(custom.clone());
                }
            }
            kind => insert_name(&mut self.text_arguments, kind, &argument.variable_name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
            && self.secondary_conditions.is_empty()
            && self.events.is_empty()
            && self.text_arguments.is_empty()
            && self.custom_conditions.is_empty()
            && self.custom_events.is_empty()
            && self.custom_text_arguments.is_empty()
    }
}

fn insert_name<K: Ord>(map: &mut BTreeMap<K, BTreeSet<String>>, kind: K, name: &str) {
    let names = map.entry(kind).or_default();
    if !name.is_empty() {
        names.insert(name.to_string());
    }
}

/// Result of a full aggregation pass. Computed without touching the dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub participants_data: IndexMap<String, ParticipantData>,
    pub speaker_states: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

struct Aggregator {
    out: Aggregation,
}

impl Aggregator {
    fn entry(
        &mut self,
        participant_name: &str,
        fallback: &str,
        node_ref: NodeRef,
        node: &Node,
        what: &str,
    ) -> Option<&mut ParticipantData> {
        let name = if participant_name.is_empty() {
            fallback
        } else {
            participant_name
        };
        if name.is_empty() {
            warn!(
                node = %node_ref.label(),
                what,
                "ignoring entry without participant name (node has no participant either)"
            );
            self.out.diagnostics.push(
                Diagnostic::warning(
                    PARTICIPANT_UNRESOLVED,
                    format!(
                        "Dropped {} on {}: neither the entry nor the node names a participant.",
                        what,
                        node_ref.label()
                    ),
                )
                .at(node_ref, node.guid),
            );
            return None;
        }
        Some(
            self.out
                .participants_data
                .entry(name.to_string())
                .or_default(),
        )
    }

    fn add_conditions(
        &mut self,
        conditions: &[Condition],
        node_ref: NodeRef,
        node: &Node,
        what: &str,
    ) {
        let fallback = node.participant_name.as_str();
        for condition in conditions {
            if condition.is_participant_involved() {
                if let Some(entry) = self.entry(
                    &condition.participant_name,
                    fallback,
                    node_ref,
                    node,
                    what,
                ) {
                    entry.add_condition_primary(condition);
                }
            }
            if let Some(other) = condition.other_participant() {
                if condition.is_second_participant_involved() {
                    if let Some(entry) = self.entry(other, fallback, node_ref, node, what) {
                        entry.add_condition_secondary(condition);
                    }
                }
            }
        }
    }

    fn add_edge_data(&mut self, node_ref: NodeRef, node: &Node) {
        for edge in &node.children {
            let what = format!("edge condition to node {}", edge.target_index);
            self.add_conditions(&edge.conditions, node_ref, node, &what);
        }
    }

    fn add_regular_node(&mut self, node_ref: NodeRef, node: &Node) {
        let mut associated = Vec::new();
        node.associated_participants(&mut associated);
        for participant in associated {
            self.out.participants_data.entry(participant).or_default();
        }

        node.add_speaker_states(&mut self.out.speaker_states);

        self.add_conditions(&node.enter_conditions, node_ref, node, "enter condition");
        self.add_edge_data(node_ref, node);

        let fallback = node.participant_name.as_str();
        for edge in &node.children {
            self.out.speaker_states.insert(edge.speaker_state.clone());
            for argument in &edge.text_arguments {
                if let Some(entry) = self.entry(
                    &argument.participant_name,
                    fallback,
                    node_ref,
                    node,
                    "edge text argument",
                ) {
                    entry.add_text_argument(argument);
                }
            }
        }

        for event in &node.enter_events {
            if let Some(entry) =
                self.entry(&event.participant_name, fallback, node_ref, node, "enter event")
            {
                entry.add_event(event);
            }
        }

        for argument in node.text_arguments() {
            if let Some(entry) = self.entry(
                &argument.participant_name,
                fallback,
                node_ref,
                node,
                "text argument",
            ) {
                entry.add_text_argument(argument);
            }
        }
    }
}

/// Full-graph pass: which conditions/events/text arguments touch which participant.
pub fn aggregate(dialogue: &Dialogue) -> Aggregation {
    let mut aggregator = Aggregator {
        out: Aggregation::default(),
    };

    for (index, node) in dialogue.start_nodes().iter().enumerate() {
        let node_ref = NodeRef::Start(index);
        aggregator.add_conditions(&node.enter_conditions, node_ref, node, "enter condition");
        aggregator.add_edge_data(node_ref, node);
        // Start nodes fire their enter events when taken.
        let fallback = node.participant_name.as_str();
        for event in &node.enter_events {
            if let Some(entry) =
                aggregator.entry(&event.participant_name, fallback, node_ref, node, "enter event")
            {
                entry.add_event(event);
            }
        }
    }

    for (index, node) in dialogue.nodes().iter().enumerate() {
        aggregator.add_regular_node(NodeRef::Regular(index), node);
    }

    aggregator.out.speaker_states.remove("");
    aggregator.out
}

/// Reconciles the class registry against the aggregated participant names.
pub fn reconcile_participant_classes(
    existing: &[ParticipantClassBinding],
    participants: &IndexMap<String, ParticipantData>,
    settings: &DialogueSettings,
    catalog: &ParticipantClassCatalog,
) -> Vec<ParticipantClassBinding> {
    let mut bindings = existing
        .iter()
        .filter(|binding| {
            !binding.participant_name.is_empty()
                && participants.contains_key(&binding.participant_name)
        })
        .cloned()
        .collect::<Vec<_>>();

    for participant in participants.keys() {
        if !bindings
            .iter()
            .any(|binding| &binding.participant_name == participant)
        {
            bindings.push(ParticipantClassBinding {
                participant_name: participant.clone(),
                class_name: None,
            });
        }
    }

    if settings.auto_set_default_participant_classes {
        for binding in bindings.iter_mut().filter(|b| b.class_name.is_none()) {
            if let Some(class) = catalog.unique_candidate(&binding.participant_name) {
                binding.class_name = Some(class.name.clone());
            }
        }
    }

    bindings
}

impl Dialogue {
    /// Rebuilds participant data, speaker states and the class registry from scratch.
    pub fn refresh(
        &mut self,
        settings: &DialogueSettings,
        catalog: &ParticipantClassCatalog,
    ) -> Vec<Diagnostic> {
        info!(dialogue = %self.name, "refreshing participant data");
        let Aggregation {
            participants_data,
            speaker_states,
            diagnostics,
        } = aggregate(self);
        let participant_classes = reconcile_participant_classes(
            &self.participant_classes,
            &participants_data,
            settings,
            catalog,
        );

        self.participants_data = participants_data;
        self.speaker_states = speaker_states;
        self.participant_classes = participant_classes;
        diagnostics
    }
}
