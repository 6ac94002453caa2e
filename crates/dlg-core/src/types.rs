use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryRestriction {
    /// Node can be entered any number of times.
    #[default]
    None,
    /// Node can be entered once per session (checked against the session history).
    OncePerContext,
    /// Node can be entered once across all sessions (checked against the global memory).
    Once,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKind {
    #[default]
    EventCall,
    BoolCall,
    IntCall,
    FloatCall,
    NameCall,
    ClassBoolVariable,
    ClassIntVariable,
    ClassFloatVariable,
    ClassNameVariable,
    WasNodeVisited,
    HasSatisfiedChild,
    Custom,
}

impl ConditionKind {
    pub fn is_class_variable(self) -> bool {
        matches!(
            self,
            Self::ClassBoolVariable
                | Self::ClassIntVariable
                | Self::ClassFloatVariable
                | Self::ClassNameVariable
        )
    }

    /// Kinds that compare a value and may therefore read it from a second participant.
    pub fn is_value_comparison(self) -> bool {
        self.is_class_variable()
            || matches!(
                self,
                Self::BoolCall | Self::IntCall | Self::FloatCall | Self::NameCall
            )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    #[default]
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Operation {
    pub fn compare<T: PartialOrd>(self, left: T, right: T) -> bool {
        match self {
            Self::Equal => left == right,
            Self::NotEqual => left != right,
            Self::Less => left < right,
            Self::LessOrEqual => left <= right,
            Self::Greater => left > right,
            Self::GreaterOrEqual => left >= right,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Condition {
    pub kind: ConditionKind,
    /// Empty means the owning node's participant.
    pub participant_name: String,
    pub callback_name: String,
    pub operation: Operation,
    pub bool_value: bool,
    pub int_value: i32,
    pub float_value: f32,
    pub name_value: String,
    /// When set, the value is compared against this participant's `other_variable_name`.
    pub other_participant_name: Option<String>,
    pub other_variable_name: String,
    pub node_guid: Uuid,
    pub long_term_memory: bool,
    pub negated: bool,
    pub custom: Option<String>,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            kind: ConditionKind::EventCall,
            participant_name: String::new(),
            callback_name: String::new(),
            operation: Operation::Equal,
            bool_value: true,
            int_value: 0,
            float_value: 0.0,
            name_value: String::new(),
            other_participant_name: None,
            other_variable_name: String::new(),
            node_guid: Uuid::nil(),
            long_term_memory: true,
            negated: false,
            custom: None,
        }
    }
}

impl Condition {
    pub fn event_call(participant_name: &str, callback_name: &str) -> Self {
        Self {
            kind: ConditionKind::EventCall,
            participant_name: participant_name.to_string(),
            callback_name: callback_name.to_string(),
            ..Self::default()
        }
    }

    pub fn bool_call(participant_name: &str, callback_name: &str, expected: bool) -> Self {
        Self {
            kind: ConditionKind::BoolCall,
            participant_name: participant_name.to_string(),
            callback_name: callback_name.to_string(),
            bool_value: expected,
            ..Self::default()
        }
    }

    pub fn int_call(
        participant_name: &str,
        callback_name: &str,
        operation: Operation,
        value: i32,
    ) -> Self {
        Self {
            kind: ConditionKind::IntCall,
            participant_name: participant_name.to_string(),
            callback_name: callback_name.to_string(),
            operation,
            int_value: value,
            ..Self::default()
        }
    }

    pub fn was_node_visited(node_guid: Uuid, expected: bool, long_term_memory: bool) -> Self {
        Self {
            kind: ConditionKind::WasNodeVisited,
            node_guid,
            bool_value: expected,
            long_term_memory,
            ..Self::default()
        }
    }

    pub fn custom(participant_name: &str, handler: &str) -> Self {
        Self {
            kind: ConditionKind::Custom,
            participant_name: participant_name.to_string(),
            custom: Some(handler.to_string()),
            ..Self::default()
        }
    }

    pub fn with_other_participant(mut self, participant_name: &str, variable_name: &str) -> Self {
        self.other_participant_name = Some(participant_name.to_string());
        self.other_variable_name = variable_name.to_string();
        self
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn is_participant_involved(&self) -> bool {
        !matches!(
            self.kind,
            ConditionKind::WasNodeVisited | ConditionKind::HasSatisfiedChild
        )
    }

    pub fn other_participant(&self) -> Option<&str> {
        self.other_participant_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    pub fn is_second_participant_involved(&self) -> bool {
        self.kind.is_value_comparison() && self.other_participant().is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    #[default]
    Event,
    ModifyBool,
    ModifyInt,
    ModifyFloat,
    ModifyName,
    ModifyClassBoolVariable,
    ModifyClassIntVariable,
    ModifyClassFloatVariable,
    ModifyClassNameVariable,
    Custom,
}

impl EventKind {
    pub fn is_class_variable(self) -> bool {
        matches!(
            self,
            Self::ModifyClassBoolVariable
                | Self::ModifyClassIntVariable
                | Self::ModifyClassFloatVariable
                | Self::ModifyClassNameVariable
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    pub kind: EventKind,
    pub participant_name: String,
    pub event_name: String,
    pub bool_value: bool,
    pub int_value: i32,
    pub float_value: f32,
    pub name_value: String,
    /// Int/float modifications add to the current value instead of replacing it.
    pub delta: bool,
    pub custom: Option<String>,
}

impl Event {
    pub fn call(participant_name: &str, event_name: &str) -> Self {
        Self {
            kind: EventKind::Event,
            participant_name: participant_name.to_string(),
            event_name: event_name.to_string(),
            ..Self::default()
        }
    }

    pub fn modify_int(participant_name: &str, event_name: &str, value: i32, delta: bool) -> Self {
        Self {
            kind: EventKind::ModifyInt,
            participant_name: participant_name.to_string(),
            event_name: event_name.to_string(),
            int_value: value,
            delta,
            ..Self::default()
        }
    }

    pub fn modify_bool(participant_name: &str, event_name: &str, value: bool) -> Self {
        Self {
            kind: EventKind::ModifyBool,
            participant_name: participant_name.to_string(),
            event_name: event_name.to_string(),
            bool_value: value,
            ..Self::default()
        }
    }

    pub fn custom(participant_name: &str, handler: &str) -> Self {
        Self {
            kind: EventKind::Custom,
            participant_name: participant_name.to_string(),
            custom: Some(handler.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextArgumentKind {
    #[default]
    DisplayName,
    DialogueInt,
    DialogueFloat,
    ClassInt,
    ClassFloat,
    ClassText,
    Custom,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextArgument {
    /// Placeholder name inside the text, e.g. `Name` for `{Name}`.
    pub display_string: String,
    pub kind: TextArgumentKind,
    pub participant_name: String,
    pub variable_name: String,
    pub custom: Option<String>,
}

impl TextArgument {
    pub fn new(
        display_string: &str,
        kind: TextArgumentKind,
        participant_name: &str,
        variable_name: &str,
    ) -> Self {
        Self {
            display_string: display_string.to_string(),
            kind,
            participant_name: participant_name.to_string(),
            variable_name: variable_name.to_string(),
            custom: None,
        }
    }
}

/// Classification of a player answer, consumed by external answer matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnswerIntend {
    #[default]
    Default,
    Any,
    Rest,
    Answer,
    Agree,
    Refuse,
    Flirt,
    Insult,
    Question,
    Apology,
    Please,
    Leave,
    Return,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Edge {
    pub target_index: usize,
    pub text: String,
    pub text_arguments: Vec<TextArgument>,
    pub conditions: Vec<Condition>,
    pub events: Vec<Event>,
    pub speaker_state: String,
    pub intend: AnswerIntend,
    pub include_in_all_options_if_unsatisfied: bool,
}

impl Default for Edge {
    fn default() -> Self {
        Self {
            target_index: 0,
            text: String::new(),
            text_arguments: Vec::new(),
            conditions: Vec::new(),
            events: Vec::new(),
            speaker_state: String::new(),
            intend: AnswerIntend::Default,
            include_in_all_options_if_unsatisfied: true,
        }
    }
}

impl Edge {
    pub fn to(target_index: usize) -> Self {
        Self {
            target_index,
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_speaker_state(mut self, speaker_state: &str) -> Self {
        self.speaker_state = speaker_state.to_string();
        self
    }

    pub fn with_text_argument(mut self, argument: TextArgument) -> Self {
        self.text_arguments.push(argument);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectorType {
    #[default]
    First,
    Random,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpeechData {
    pub text: String,
    pub text_arguments: Vec<TextArgument>,
    pub speaker_state: String,
    pub is_virtual_parent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DialogueTransition {
    pub dialogue_name: String,
    pub branch_tag: String,
    pub start_node_guid: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EndData {
    pub return_to_main_on_end: Option<bool>,
    pub transition: Option<DialogueTransition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    #[serde(rename_all = "camelCase")]
    Start {
        #[serde(default)]
        branch_tag: String,
        #[serde(default)]
        exclude_from_default_start: bool,
    },
    Speech(SpeechData),
    #[serde(rename_all = "camelCase")]
    Selector {
        #[serde(default)]
        selector_type: SelectorType,
    },
    End(EndData),
    #[serde(rename_all = "camelCase")]
    Proxy { target_index: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default)]
    pub guid: Uuid,
    #[serde(default)]
    pub participant_name: String,
    #[serde(default)]
    pub check_children_on_evaluation: bool,
    #[serde(default)]
    pub enter_conditions: Vec<Condition>,
    #[serde(default)]
    pub enter_restriction: EntryRestriction,
    #[serde(default)]
    pub enter_events: Vec<Event>,
    #[serde(default)]
    pub children: Vec<Edge>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            guid: Uuid::nil(),
            participant_name: String::new(),
            check_children_on_evaluation: false,
            enter_conditions: Vec::new(),
            enter_restriction: EntryRestriction::None,
            enter_events: Vec::new(),
            children: Vec::new(),
            kind,
        }
    }

    pub fn start() -> Self {
        Self::new(NodeKind::Start {
            branch_tag: String::new(),
            exclude_from_default_start: false,
        })
    }

    pub fn speech(participant_name: &str, text: &str) -> Self {
        let mut node = Self::new(NodeKind::Speech(SpeechData {
            text: text.to_string(),
            ..SpeechData::default()
        }));
        node.participant_name = participant_name.to_string();
        node
    }

    pub fn selector(selector_type: SelectorType) -> Self {
        Self::new(NodeKind::Selector { selector_type })
    }

    pub fn end() -> Self {
        Self::new(NodeKind::End(EndData::default()))
    }

    pub fn proxy(target_index: usize) -> Self {
        Self::new(NodeKind::Proxy { target_index })
    }

    pub fn with_guid(mut self, guid: Uuid) -> Self {
        self.guid = guid;
        self
    }

    pub fn with_participant(mut self, participant_name: &str) -> Self {
        self.participant_name = participant_name.to_string();
        self
    }

    pub fn with_child(mut self, edge: Edge) -> Self {
        self.children.push(edge);
        self
    }

    pub fn with_enter_condition(mut self, condition: Condition) -> Self {
        self.enter_conditions.push(condition);
        self
    }

    pub fn with_enter_event(mut self, event: Event) -> Self {
        self.enter_events.push(event);
        self
    }

    pub fn with_restriction(mut self, restriction: EntryRestriction) -> Self {
        self.enter_restriction = restriction;
        self
    }

    pub fn with_text_argument(mut self, argument: TextArgument) -> Self {
        if let NodeKind::Speech(speech) = &mut self.kind {
            speech.text_arguments.push(argument);
        }
        self
    }

    pub fn with_speaker_state(mut self, speaker_state: &str) -> Self {
        if let NodeKind::Speech(speech) = &mut self.kind {
            speech.speaker_state = speaker_state.to_string();
        }
        self
    }

    /// Marks a speech node as a virtual parent. No-op for other variants.
    pub fn virtual_parent(mut self) -> Self {
        if let NodeKind::Speech(speech) = &mut self.kind {
            speech.is_virtual_parent = true;
        }
        self
    }

    pub fn has_guid(&self) -> bool {
        !self.guid.is_nil()
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Start { .. } => "start",
            NodeKind::Speech(_) => "speech",
            NodeKind::Selector { .. } => "selector",
            NodeKind::End(_) => "end",
            NodeKind::Proxy { .. } => "proxy",
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self.kind, NodeKind::Start { .. })
    }

    pub fn is_end(&self) -> bool {
        matches!(self.kind, NodeKind::End(_))
    }

    pub fn is_speech(&self) -> bool {
        matches!(self.kind, NodeKind::Speech(_))
    }

    pub fn is_virtual_parent(&self) -> bool {
        matches!(&self.kind, NodeKind::Speech(speech) if speech.is_virtual_parent)
    }

    pub fn text(&self) -> &str {
        match &self.kind {
            NodeKind::Speech(speech) => speech.text.as_str(),
            _ => "",
        }
    }

    pub fn text_arguments(&self) -> &[TextArgument] {
        match &self.kind {
            NodeKind::Speech(speech) => speech.text_arguments.as_slice(),
            _ => &[],
        }
    }

    pub fn speaker_state(&self) -> &str {
        match &self.kind {
            NodeKind::Speech(speech) => speech.speaker_state.as_str(),
            _ => "",
        }
    }

    pub fn has_any_enter_conditions(&self) -> bool {
        !self.enter_conditions.is_empty() || self.enter_restriction != EntryRestriction::None
    }

    /// Appends participants referenced by this node that are not yet in `out`.
    pub fn associated_participants(&self, out: &mut Vec<String>) {
        let mut push_unique = |name: &str| {
            if !name.is_empty() && !out.iter().any(|existing| existing == name) {
                out.push(name.to_string());
            }
        };
        push_unique(&self.participant_name);
        for argument in self.text_arguments() {
            push_unique(&argument.participant_name);
        }
    }

    pub fn add_speaker_states(&self, out: &mut BTreeSet<String>) {
        out.insert(self.speaker_state().to_string());
    }
}
