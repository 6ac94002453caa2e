pub mod custom;
pub mod engine;
pub mod format;
pub mod history;
pub mod participant;

pub use custom::{CustomCall, CustomCondition, CustomEvent, CustomRegistry, CustomTextArgument};
pub use engine::{
    missing_participants, ContextOption, ContextOptions, ContextSnapshot, DialogueContext,
    EndOutcome, ParticipantMap, SNAPSHOT_SCHEMA,
};
pub use format::{BraceTextFormatter, TextFormatter};
pub use history::{DialogueMemory, HistoryEntry, NodeHistory, SharedMemory};
pub use participant::{DialogueParticipant, MemoryParticipant, MemoryState};
