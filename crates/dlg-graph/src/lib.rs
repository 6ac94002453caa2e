pub mod aggregate;
pub mod diagnostics;
pub mod dialogue;
pub mod participants;
pub mod search;
pub mod settings;
pub mod validate;

pub use aggregate::{aggregate, Aggregation, ParticipantData};
pub use diagnostics::{Diagnostic, Severity};
pub use dialogue::{Dialogue, NodeRef};
pub use participants::{
    ClassOrigin, ClassProperty, ClassValueType, ParticipantClass, ParticipantClassBinding,
    ParticipantClassCatalog,
};
pub use search::{find_text, replace_text, TextMatch};
pub use settings::DialogueSettings;
pub use validate::validate;
