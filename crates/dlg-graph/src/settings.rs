use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DialogueSettings {
    /// Bind a participant to its implementing class when exactly one candidate exists.
    pub auto_set_default_participant_classes: bool,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            auto_set_default_participant_classes: true,
        }
    }
}
