pub mod content;
pub mod log;
pub mod trigger;

pub use content::{Comment, Item, ItemKind, ItemRef, MediaRef, NewItem, Taxonomy, UploadedFile};
pub use log::{Direction, LogEntry, NewLogEntry};
pub use trigger::{TriggerConfig, TriggerKind};
