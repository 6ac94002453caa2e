use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "dlg-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    /// Dialogue file relative to the case directory.
    #[serde(default = "default_dialogue_file")]
    pub dialogue: String,
    /// Participant states file (name -> state) relative to the case directory.
    #[serde(default)]
    pub participants: Option<String>,
    #[serde(default)]
    pub start_index: Option<usize>,
    #[serde(default)]
    pub branch_tag: Option<String>,
    #[serde(default = "default_random_seed")]
    pub random_seed: u32,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
    /// Participant name -> events it must have received, in order.
    #[serde(default)]
    pub expected_fired_events: BTreeMap<String, Vec<String>>,
}

fn default_dialogue_file() -> String {
    "dialogue.json".to_string()
}

fn default_random_seed() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TestAction {
    /// Index into the satisfied options.
    Choose { index: usize },
    /// Index into all options, disabled ones included.
    ChooseAll { index: usize },
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Choose { .. } => "choose",
            Self::ChooseAll { .. } => "chooseAll",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpectedEvent {
    Speech { speaker: String, text: String },
    Choices { choices: Vec<String> },
    End,
}

#[cfg(test)]
mod case_tests {
    use super::*;

    #[test]
    fn test_action_kind_name_reports_expected_value() {
        assert_eq!(TestAction::Choose { index: 0 }.kind_name(), "choose");
        assert_eq!(TestAction::ChooseAll { index: 1 }.kind_name(), "chooseAll");
    }

    #[test]
    fn testcase_deserialize_applies_defaults() {
        let parsed: TestCase = serde_json::from_str(
            r#"{
  "schemaVersion": "dlg-tool-case.v1",
  "actions": [],
  "expectedEvents": []
}"#,
        )
        .expect("testcase should deserialize");

        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert_eq!(parsed.dialogue, "dialogue.json");
        assert_eq!(parsed.random_seed, 1);
        assert!(parsed.participants.is_none());
        assert!(parsed.start_index.is_none());
        assert!(parsed.expected_fired_events.is_empty());
    }

    #[test]
    fn expected_event_and_action_deserialize_supports_all_variants() {
        let events: Vec<ExpectedEvent> = serde_json::from_str(
            r#"[
  {"kind":"speech","speaker":"Guard","text":"Halt."},
  {"kind":"choices","choices":["A"]},
  {"kind":"end"}
]"#,
        )
        .expect("events should deserialize");
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ExpectedEvent::Speech { .. }));
        assert!(matches!(events[1], ExpectedEvent::Choices { .. }));
        assert!(matches!(events[2], ExpectedEvent::End));

        let actions: Vec<TestAction> = serde_json::from_str(
            r#"[{"kind":"choose","index":0},{"kind":"chooseAll","index":2}]"#,
        )
        .expect("actions should deserialize");
        assert_eq!(
            actions,
            vec![
                TestAction::Choose { index: 0 },
                TestAction::ChooseAll { index: 2 }
            ]
        );
    }
}
