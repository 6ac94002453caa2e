use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use dlg_core::{DialogueError, DlgValue};
use serde::{Deserialize, Serialize};

/// Capability surface conditions, events and text arguments call into.
///
/// Every method defaults to `PARTICIPANT_CAPABILITY_MISSING`, so an implementor only
/// provides what its content needs and "not found" stays distinct from `Ok(false)`.
pub trait DialogueParticipant: Send + Sync {
    fn participant_name(&self) -> &str;

    fn display_name(&self) -> Result<String, DialogueError> {
        Err(self.missing("display name", ""))
    }

    fn check_condition(&self, name: &str) -> Result<bool, DialogueError> {
        Err(self.missing("condition", name))
    }

    fn get_bool(&self, name: &str) -> Result<bool, DialogueError> {
        Err(self.missing("bool value", name))
    }

    fn get_int(&self, name: &str) -> Result<i32, DialogueError> {
        Err(self.missing("int value", name))
    }

    fn get_float(&self, name: &str) -> Result<f32, DialogueError> {
        Err(self.missing("float value", name))
    }

    fn get_name(&self, name: &str) -> Result<String, DialogueError> {
        Err(self.missing("name value", name))
    }

    fn class_variable(&self, name: &str) -> Result<DlgValue, DialogueError> {
        Err(self.missing("class variable", name))
    }

    fn on_event(&self, name: &str) -> Result<(), DialogueError> {
        Err(self.missing("event", name))
    }

    fn modify_bool(&self, name: &str, _value: bool) -> Result<(), DialogueError> {
        Err(self.missing("bool value", name))
    }

    fn modify_int(&self, name: &str, _value: i32, _delta: bool) -> Result<(), DialogueError> {
        Err(self.missing("int value", name))
    }

    fn modify_float(&self, name: &str, _value: f32, _delta: bool) -> Result<(), DialogueError> {
        Err(self.missing("float value", name))
    }

    fn modify_name(&self, name: &str, _value: &str) -> Result<(), DialogueError> {
        Err(self.missing("name value", name))
    }

    fn set_class_variable(&self, name: &str, _value: DlgValue) -> Result<(), DialogueError> {
        Err(self.missing("class variable", name))
    }

    #[doc(hidden)]
    fn missing(&self, kind: &str, name: &str) -> DialogueError {
        DialogueError::capability_missing(self.participant_name(), kind, name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryState {
    pub display_name: Option<String>,
    pub bools: BTreeMap<String, bool>,
    pub ints: BTreeMap<String, i32>,
    pub floats: BTreeMap<String, f32>,
    pub names: BTreeMap<String, String>,
    pub class_variables: BTreeMap<String, DlgValue>,
    /// Results returned for `check_condition` callbacks.
    pub conditions: BTreeMap<String, bool>,
    pub fired_events: Vec<String>,
}

/// Participant backed by plain maps. Values that are absent count as missing
/// capabilities, except that modifications create the value.
#[derive(Debug, Default)]
pub struct MemoryParticipant {
    name: String,
    state: Mutex<MemoryState>,
}

impl MemoryParticipant {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_state(name, MemoryState::default())
    }

    pub fn with_state(name: impl Into<String>, state: MemoryState) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(state),
        }
    }

    pub fn state(&self) -> MemoryState {
        self.lock().clone()
    }

    pub fn fired_events(&self) -> Vec<String> {
        self.lock().fired_events.clone()
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.lock().ints.insert(name.to_string(), value);
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.lock().bools.insert(name.to_string(), value);
    }

    pub fn set_condition(&self, name: &str, value: bool) {
        self.lock().conditions.insert(name.to_string(), value);
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T: Clone>(
        &self,
        kind: &str,
        name: &str,
        pick: impl FnOnce(&MemoryState) -> Option<&T>,
    ) -> Result<T, DialogueError> {
        let state = self.lock();
        let value = pick(&state).cloned();
        value.ok_or_else(|| self.missing(kind, name))
    }
}

impl DialogueParticipant for MemoryParticipant {
    fn participant_name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> Result<String, DialogueError> {
        Ok(self
            .lock()
            .display_name
            .clone()
            .unwrap_or_else(|| self.name.clone()))
    }

    fn check_condition(&self, name: &str) -> Result<bool, DialogueError> {
        self.read("condition", name, |state| state.conditions.get(name))
    }

    fn get_bool(&self, name: &str) -> Result<bool, DialogueError> {
        self.read("bool value", name, |state| state.bools.get(name))
    }

    fn get_int(&self, name: &str) -> Result<i32, DialogueError> {
        self.read("int value", name, |state| state.ints.get(name))
    }

    fn get_float(&self, name: &str) -> Result<f32, DialogueError> {
        self.read("float value", name, |state| state.floats.get(name))
    }

    fn get_name(&self, name: &str) -> Result<String, DialogueError> {
        self.read("name value", name, |state| state.names.get(name))
    }

    fn class_variable(&self, name: &str) -> Result<DlgValue, DialogueError> {
        self.read("class variable", name, |state| state.class_variables.get(name))
    }

    fn on_event(&self, name: &str) -> Result<(), DialogueError> {
        self.lock().fired_events.push(name.to_string());
        Ok(())
    }

    fn modify_bool(&self, name: &str, value: bool) -> Result<(), DialogueError> {
        self.lock().bools.insert(name.to_string(), value);
        Ok(())
    }

    fn modify_int(&self, name: &str, value: i32, delta: bool) -> Result<(), DialogueError> {
        let mut state = self.lock();
        let slot = state.ints.entry(name.to_string()).or_insert(0);
        *slot = if delta { slot.saturating_add(value) } else { value };
        Ok(())
    }

    fn modify_float(&self, name: &str, value: f32, delta: bool) -> Result<(), DialogueError> {
        let mut state = self.lock();
        let slot = state.floats.entry(name.to_string()).or_insert(0.0);
        *slot = if delta { *slot + value } else { value };
        Ok(())
    }

    fn modify_name(&self, name: &str, value: &str) -> Result<(), DialogueError> {
        self.lock()
            .names
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn set_class_variable(&self, name: &str, value: DlgValue) -> Result<(), DialogueError> {
        let mut state = self.lock();
        let existing_type = state.class_variables.get(name).map(DlgValue::type_name);
        match existing_type {
            Some(existing) if existing != value.type_name() => Err(DialogueError::new(
                "PARTICIPANT_VARIABLE_TYPE",
                format!(
                    "Class variable \"{}\" of \"{}\" is {} but got {}.",
                    name,
                    self.name,
                    existing,
                    value.type_name()
                ),
            )),
            Some(_) => {
                state.class_variables.insert(name.to_string(), value);
                Ok(())
            }
            None => Err(self.missing("class variable", name)),
        }
    }
}
