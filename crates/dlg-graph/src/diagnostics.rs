use std::fmt;

use dlg_core::Uuid;
use serde::{Deserialize, Serialize};

use crate::dialogue::NodeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub node: Option<NodeRef>,
    pub node_guid: Option<Uuid>,
}

impl Diagnostic {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message: message.into(),
            node: None,
            node_guid: None,
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::warning(code, message)
        }
    }

    pub fn at(mut self, node: NodeRef, guid: Uuid) -> Self {
        self.node = Some(node);
        self.node_guid = (!guid.is_nil()).then_some(guid);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.node {
            Some(node) => write!(
                f,
                "{} {} ({}): {}",
                severity,
                self.code,
                node.label(),
                self.message
            ),
            None => write!(f, "{} {}: {}", severity, self.code, self.message),
        }
    }
}
