use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct DialogueError {
    pub code: String,
    pub message: String,
    pub node_index: Option<usize>,
}

impl DialogueError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            node_index: None,
        }
    }

    pub fn at_node(code: impl Into<String>, message: impl Into<String>, node_index: usize) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            node_index: Some(node_index),
        }
    }

    pub fn with_node(mut self, node_index: Option<usize>) -> Self {
        self.node_index = node_index;
        self
    }

    /// Error returned by participants that do not expose the requested capability.
    pub fn capability_missing(participant: &str, kind: &str, name: &str) -> Self {
        Self::new(
            "PARTICIPANT_CAPABILITY_MISSING",
            format!(
                "Participant \"{}\" does not expose {} \"{}\".",
                participant, kind, name
            ),
        )
    }

    pub fn is_capability_missing(&self) -> bool {
        self.code == "PARTICIPANT_CAPABILITY_MISSING"
    }
}
