mod objectives;
mod store;

pub use objectives::{ObjectiveState, TaskState};
pub use store::{CollectedEntry, CompletionQuery, ProgressSnapshot, ProgressStore};
