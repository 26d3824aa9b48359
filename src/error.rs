//! Error types for the preprocess generator
//!
//! Library code returns these typed errors; the binary wraps them in `anyhow`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::TypeId;

/// Failure raised by a source model while enumerating or resolving types
#[derive(Error, Debug)]
pub enum SourceModelError {
    #[error("Failed to parse {}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Cannot resolve type '{name}' referenced from {referenced_from}")]
    UnresolvedType {
        name: String,
        referenced_from: String,
    },

    #[error("Cycle detected in the type hierarchy of {fqn}")]
    CyclicHierarchy { fqn: String },

    #[error("Unknown type id {0:?}")]
    UnknownType(TypeId),

    #[error("Invalid classpath file {}: {message}", path.display())]
    Classpath { path: PathBuf, message: String },

    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Terminal failure of one generator invocation
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    SourceModel(#[from] SourceModelError),

    #[error("Failed to create /{}", artifact_name(path))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The workspace could not refresh its view after a successful write.
///
/// Never turns an invocation into a failure; the artifact on disk is already correct.
#[derive(Error, Debug)]
#[error("Failed to refresh {}", dir.display())]
pub struct WorkspaceRefreshError {
    pub dir: PathBuf,
    #[source]
    pub source: io::Error,
}

fn artifact_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
