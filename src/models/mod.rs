// ABOUTME: Core data models for sessions, workspace bindings, tracked files, and command results

pub mod result;
pub mod session;
pub mod workspace;

pub use result::{CommandResult, EditRequest};
pub use session::HistoryEntry;
pub use workspace::{TrackedFile, WorkspaceBinding};
