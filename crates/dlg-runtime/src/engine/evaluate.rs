use dlg_core::{
    Condition, ConditionKind, DialogueError, DlgValue, Edge, EntryRestriction, Event, EventKind,
    Node, NodeKind, TextArgument, TextArgumentKind,
};
use dlg_graph::NodeRef;
use tracing::{debug, warn};

use super::{DialogueContext, NodeSet};
use crate::custom::CustomCall;
use crate::participant::DialogueParticipant;

fn effective_name<'a>(name: &'a str, fallback: &'a str) -> &'a str {
    if name.is_empty() {
        fallback
    } else {
        name
    }
}

fn type_mismatch(name: &str, expected: &str, value: &DlgValue) -> DialogueError {
    DialogueError::new(
        "PARTICIPANT_VARIABLE_TYPE",
        format!(
            "Variable \"{}\" is {} but {} was expected.",
            name,
            value.type_name(),
            expected
        ),
    )
}

impl DialogueContext {
    pub(crate) fn lookup_participant(
        &self,
        name: &str,
    ) -> Result<&dyn DialogueParticipant, DialogueError> {
        self.participants
            .get(name)
            .map(|participant| participant.as_ref())
            .ok_or_else(|| {
                DialogueError::new(
                    "PARTICIPANT_NOT_FOUND",
                    format!("No participant named \"{}\" is bound to the session.", name),
                )
            })
    }

    fn custom_call<'a>(&'a self, participant_name: &'a str) -> CustomCall<'a> {
        CustomCall {
            dialogue: &self.dialogue,
            active_node_index: self.active_node,
            participant_name,
            participant: self.lookup_participant(participant_name).ok(),
        }
    }

    /// Restriction, enter conditions, proxy target and optionally children.
    /// A node already in `visited` is assumed enterable so mutual references terminate.
    pub(crate) fn check_node_enter_conditions(&self, node_ref: NodeRef, mut visited: NodeSet) -> bool {
        if !visited.insert(node_ref) {
            return true;
        }
        let Some(node) = self.dialogue.resolve(node_ref) else {
            return false;
        };

        if !self.check_restriction(node_ref, node) {
            return false;
        }
        if !node
            .enter_conditions
            .iter()
            .all(|condition| self.evaluate_condition(condition, node, &visited))
        {
            return false;
        }
        if let NodeKind::Proxy { target_index } = node.kind {
            if !self.check_node_enter_conditions(NodeRef::Regular(target_index), visited.clone()) {
                return false;
            }
        }
        if node.check_children_on_evaluation && !self.has_any_satisfied_child(node_ref, visited) {
            return false;
        }
        true
    }

    fn check_restriction(&self, node_ref: NodeRef, node: &Node) -> bool {
        let NodeRef::Regular(index) = node_ref else {
            return true;
        };
        match node.enter_restriction {
            EntryRestriction::None => true,
            EntryRestriction::OncePerContext => !self.history.contains(index, node.guid),
            EntryRestriction::Once => {
                !self
                    .memory
                    .is_node_visited(&self.dialogue.guid, index, node.guid)
            }
        }
    }

    pub(crate) fn has_any_satisfied_child(&self, node_ref: NodeRef, visited: NodeSet) -> bool {
        let Some(node) = self.dialogue.resolve(node_ref) else {
            return false;
        };
        node.children
            .iter()
            .any(|edge| self.evaluate_edge(node, edge, visited.clone()))
    }

    /// Edge conditions AND the target's enter conditions.
    pub(crate) fn evaluate_edge(&self, owner: &Node, edge: &Edge, visited: NodeSet) -> bool {
        edge.conditions
            .iter()
            .all(|condition| self.evaluate_condition(condition, owner, &visited))
            && self.check_node_enter_conditions(NodeRef::Regular(edge.target_index), visited)
    }

    /// Unresolved capabilities evaluate to false regardless of `negated`.
    pub(crate) fn evaluate_condition(
        &self,
        condition: &Condition,
        owner: &Node,
        visited: &NodeSet,
    ) -> bool {
        let result = match condition.kind {
            ConditionKind::WasNodeVisited => Ok(self.was_guid_visited(condition) == condition.bool_value),
            ConditionKind::HasSatisfiedChild => Ok(self.check_has_satisfied_child(condition, visited)),
            _ => self.evaluate_participant_condition(condition, owner),
        };
        match result {
            Ok(value) => value != condition.negated,
            Err(error) => {
                warn!(
                    code = %error.code,
                    participant = %effective_name(&condition.participant_name, &owner.participant_name),
                    "condition treated as false: {}",
                    error.message
                );
                false
            }
        }
    }

    fn was_guid_visited(&self, condition: &Condition) -> bool {
        let index = self
            .dialogue
            .get_node_index_for_guid(&condition.node_guid)
            .unwrap_or(usize::MAX);
        if condition.long_term_memory {
            self.memory
                .is_node_visited(&self.dialogue.guid, index, condition.node_guid)
        } else {
            self.history.contains(index, condition.node_guid)
        }
    }

    fn check_has_satisfied_child(&self, condition: &Condition, visited: &NodeSet) -> bool {
        let Some(node_ref) = self.dialogue.find_by_guid(&condition.node_guid) else {
            debug!(guid = %condition.node_guid, "has-satisfied-child references unknown node");
            return !condition.bool_value;
        };
        self.has_any_satisfied_child(node_ref, visited.clone()) == condition.bool_value
    }

    fn evaluate_participant_condition(
        &self,
        condition: &Condition,
        owner: &Node,
    ) -> Result<bool, DialogueError> {
        let name = effective_name(&condition.participant_name, &owner.participant_name);

        if condition.kind == ConditionKind::Custom {
            let Some(id) = &condition.custom else {
                return Err(DialogueError::new(
                    "CONTEXT_CUSTOM_HANDLER_MISSING",
                    "Custom condition has no handler id.",
                ));
            };
            let Some(handler) = self.custom.condition(id) else {
                return Err(DialogueError::new(
                    "CONTEXT_CUSTOM_HANDLER_MISSING",
                    format!("Custom condition \"{}\" is not registered.", id),
                ));
            };
            return Ok(handler.evaluate(&self.custom_call(name)));
        }

        let participant = self.lookup_participant(name)?;
        let callback = condition.callback_name.as_str();
        let other = match condition.other_participant() {
            Some(other_name) if condition.is_second_participant_involved() => {
                Some(self.lookup_participant(other_name)?)
            }
            _ => None,
        };
        let other_variable = condition.other_variable_name.as_str();

        match condition.kind {
            ConditionKind::EventCall => {
                Ok(participant.check_condition(callback)? == condition.bool_value)
            }
            ConditionKind::BoolCall => {
                let value = participant.get_bool(callback)?;
                match other {
                    Some(other) => Ok((value == other.get_bool(other_variable)?) == condition.bool_value),
                    None => Ok(value == condition.bool_value),
                }
            }
            ConditionKind::IntCall => {
                let value = participant.get_int(callback)?;
                let rhs = match other {
                    Some(other) => other.get_int(other_variable)?,
                    None => condition.int_value,
                };
                Ok(condition.operation.compare(value, rhs))
            }
            ConditionKind::FloatCall => {
                let value = participant.get_float(callback)?;
                let rhs = match other {
                    Some(other) => other.get_float(other_variable)?,
                    None => condition.float_value,
                };
                Ok(condition.operation.compare(value, rhs))
            }
            ConditionKind::NameCall => {
                let value = participant.get_name(callback)?;
                let rhs = match other {
                    Some(other) => other.get_name(other_variable)?,
                    None => condition.name_value.clone(),
                };
                Ok(condition.operation.compare(value, rhs))
            }
            ConditionKind::ClassBoolVariable => {
                let value = class_bool(participant, callback)?;
                match other {
                    Some(other) => Ok((value == class_bool(other, other_variable)?) == condition.bool_value),
                    None => Ok(value == condition.bool_value),
                }
            }
            ConditionKind::ClassIntVariable => {
                let value = class_int(participant, callback)?;
                let rhs = match other {
                    Some(other) => class_int(other, other_variable)?,
                    None => condition.int_value,
                };
                Ok(condition.operation.compare(value, rhs))
            }
            ConditionKind::ClassFloatVariable => {
                let value = class_float(participant, callback)?;
                let rhs = match other {
                    Some(other) => class_float(other, other_variable)?,
                    None => condition.float_value,
                };
                Ok(condition.operation.compare(value, rhs))
            }
            ConditionKind::ClassNameVariable => {
                let value = class_name(participant, callback)?;
                let rhs = match other {
                    Some(other) => class_name(other, other_variable)?,
                    None => condition.name_value.clone(),
                };
                Ok(condition.operation.compare(value, rhs))
            }
            ConditionKind::WasNodeVisited
            | ConditionKind::HasSatisfiedChild
            | ConditionKind::Custom => Ok(false),
        }
    }

    /// Fires events in order. Failures are logged and skipped.
    pub(crate) fn fire_events(&self, events: &[Event], owner: &Node) {
        for event in events {
            if let Err(error) = self.fire_event(event, owner) {
                warn!(
                    code = %error.code,
                    event = %event.event_name,
                    "event skipped: {}",
                    error.message
                );
            }
        }
    }

    fn fire_event(&self, event: &Event, owner: &Node) -> Result<(), DialogueError> {
        let name = effective_name(&event.participant_name, &owner.participant_name);
        if event.kind == EventKind::Custom {
            let Some(id) = &event.custom else {
                return Err(DialogueError::new(
                    "CONTEXT_CUSTOM_HANDLER_MISSING",
                    "Custom event has no handler id.",
                ));
            };
            let Some(handler) = self.custom.event(id) else {
                return Err(DialogueError::new(
                    "CONTEXT_CUSTOM_HANDLER_MISSING",
                    format!("Custom event \"{}\" is not registered.", id),
                ));
            };
            handler.execute(&self.custom_call(name));
            return Ok(());
        }

        let participant = self.lookup_participant(name)?;
        let target = event.event_name.as_str();
        match event.kind {
            EventKind::Event => participant.on_event(target),
            EventKind::ModifyBool => participant.modify_bool(target, event.bool_value),
            EventKind::ModifyInt => participant.modify_int(target, event.int_value, event.delta),
            EventKind::ModifyFloat => {
                participant.modify_float(target, event.float_value, event.delta)
            }
            EventKind::ModifyName => participant.modify_name(target, &event.name_value),
            EventKind::ModifyClassBoolVariable => {
                participant.set_class_variable(target, DlgValue::Bool(event.bool_value))
            }
            EventKind::ModifyClassIntVariable => {
                let value = if event.delta {
                    class_int(participant, target)?.saturating_add(event.int_value)
                } else {
                    event.int_value
                };
                participant.set_class_variable(target, DlgValue::Int(value))
            }
            EventKind::ModifyClassFloatVariable => {
                let value = if event.delta {
                    class_float(participant, target)? + event.float_value
                } else {
                    event.float_value
                };
                participant.set_class_variable(target, DlgValue::Float(value))
            }
            EventKind::ModifyClassNameVariable => {
                participant.set_class_variable(target, DlgValue::Name(event.name_value.clone()))
            }
            EventKind::Custom => Ok(()),
        }
    }

    /// Resolves every text argument and hands the pairs to the formatter.
    pub(crate) fn construct_text(
        &self,
        text: &str,
        arguments: &[TextArgument],
        owner: &Node,
    ) -> String {
        if arguments.is_empty() {
            return text.to_string();
        }
        let resolved = arguments
            .iter()
            .map(|argument| {
                let value = self.resolve_text_argument(argument, owner).unwrap_or_else(|error| {
                    warn!(
                        code = %error.code,
                        argument = %argument.display_string,
                        "text argument left empty: {}",
                        error.message
                    );
                    String::new()
                });
                (argument.display_string.clone(), value)
            })
            .collect::<Vec<_>>();
        self.text_formatter.format(text, &resolved)
    }

    fn resolve_text_argument(
        &self,
        argument: &TextArgument,
        owner: &Node,
    ) -> Result<String, DialogueError> {
        let name = effective_name(&argument.participant_name, &owner.participant_name);
        if argument.kind == TextArgumentKind::Custom {
            let handler = argument
                .custom
                .as_deref()
                .and_then(|id| self.custom.text_argument(id))
                .ok_or_else(|| {
                    DialogueError::new(
                        "CONTEXT_CUSTOM_HANDLER_MISSING",
                        format!(
                            "Custom text argument \"{}\" has no registered handler.",
                            argument.display_string
                        ),
                    )
                })?;
            return Ok(handler.text(&self.custom_call(name)));
        }

        let participant = self.lookup_participant(name)?;
        let variable = argument.variable_name.as_str();
        match argument.kind {
            TextArgumentKind::DisplayName => participant.display_name(),
            TextArgumentKind::DialogueInt => Ok(participant.get_int(variable)?.to_string()),
            TextArgumentKind::DialogueFloat => Ok(participant.get_float(variable)?.to_string()),
            TextArgumentKind::ClassInt => Ok(class_int(participant, variable)?.to_string()),
            TextArgumentKind::ClassFloat => Ok(class_float(participant, variable)?.to_string()),
            TextArgumentKind::ClassText => Ok(participant.class_variable(variable)?.to_text()),
            TextArgumentKind::Custom => Ok(String::new()),
        }
    }
}

fn class_bool(participant: &dyn DialogueParticipant, name: &str) -> Result<bool, DialogueError> {
    let value = participant.class_variable(name)?;
    value.as_bool().ok_or_else(|| type_mismatch(name, "bool", &value))
}

fn class_int(participant: &dyn DialogueParticipant, name: &str) -> Result<i32, DialogueError> {
    let value = participant.class_variable(name)?;
    value.as_int().ok_or_else(|| type_mismatch(name, "int", &value))
}

fn class_float(participant: &dyn DialogueParticipant, name: &str) -> Result<f32, DialogueError> {
    let value = participant.class_variable(name)?;
    value.as_float().ok_or_else(|| type_mismatch(name, "float", &value))
}

fn class_name(participant: &dyn DialogueParticipant, name: &str) -> Result<String, DialogueError> {
    let value = participant.class_variable(name)?;
    value
        .as_name()
        .map(str::to_string)
        .ok_or_else(|| type_mismatch(name, "name", &value))
}
