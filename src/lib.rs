pub mod config;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod model;
pub mod utils;
pub mod workspace;

#[cfg(test)]
mod tests;

// Re-export main types and functions for easier access
pub use config::Settings;
pub use error::{GenerateError, SourceModelError, WorkspaceRefreshError};
pub use generator::{CancellationToken, GenerationReport, Generator, Outcome, ParcelableList, Project};
pub use model::{InMemorySourceModel, JavaSourceModel, SourceModel};
pub use workspace::{FsWorkspace, Workspace};
