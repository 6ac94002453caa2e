use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use dlg_graph::Dialogue;

use crate::participant::DialogueParticipant;

/// What a custom handler sees when it is invoked.
pub struct CustomCall<'a> {
    pub dialogue: &'a Dialogue,
    pub active_node_index: Option<usize>,
    pub participant_name: &'a str,
    pub participant: Option<&'a dyn DialogueParticipant>,
}

pub trait CustomCondition: Send + Sync {
    fn evaluate(&self, call: &CustomCall<'_>) -> bool;
}

pub trait CustomEvent: Send + Sync {
    fn execute(&self, call: &CustomCall<'_>);
}

pub trait CustomTextArgument: Send + Sync {
    fn text(&self, call: &CustomCall<'_>) -> String;
}

impl<F> CustomCondition for F
where
    F: Fn(&CustomCall<'_>) -> bool + Send + Sync,
{
    fn evaluate(&self, call: &CustomCall<'_>) -> bool {
        self(call)
    }
}

impl<F> CustomEvent for F
where
    F: Fn(&CustomCall<'_>) + Send + Sync,
{
    fn execute(&self, call: &CustomCall<'_>) {
        self(call)
    }
}

/// Named custom handlers referenced by `custom` ids in conditions, events and text arguments.
#[derive(Clone, Default)]
pub struct CustomRegistry {
    conditions: BTreeMap<String, Arc<dyn CustomCondition>>,
    events: BTreeMap<String, Arc<dyn CustomEvent>>,
    text_arguments: BTreeMap<String, Arc<dyn CustomTextArgument>>,
}

impl CustomRegistry {
    pub fn register_condition(&mut self, id: &str, handler: Arc<dyn CustomCondition>) {
        self.conditions.insert(id.to_string(), handler);
    }

    pub fn register_event(&mut self, id: &str, handler: Arc<dyn CustomEvent>) {
        self.events.insert(id.to_string(), handler);
    }

    pub fn register_text_argument(&mut self, id: &str, handler: Arc<dyn CustomTextArgument>) {
        self.text_arguments.insert(id.to_string(), handler);
    }

    pub fn condition(&self, id: &str) -> Option<&Arc<dyn CustomCondition>> {
        self.conditions.get(id)
    }

    pub fn event(&self, id: &str) -> Option<&Arc<dyn CustomEvent>> {
        self.events.get(id)
    }

    pub fn text_argument(&self, id: &str) -> Option<&Arc<dyn CustomTextArgument>> {
        self.text_arguments.get(id)
    }
}

impl fmt::Debug for CustomRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRegistry")
            .field("conditions", &self.conditions.keys().collect::<Vec<_>>())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field(
                "text_arguments",
                &self.text_arguments.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
