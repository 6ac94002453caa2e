pub mod error;
pub mod types;
pub mod value;

pub use error::DialogueError;
pub use types::*;
pub use uuid::Uuid;
pub use value::*;
