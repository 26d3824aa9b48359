use std::path::{Path, PathBuf};
use serde::Serialize;

/// A project directory selected for processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    /// Display name, the directory name by default
    pub name: String,

    /// Root directory of the project
    pub root: PathBuf,
}

impl Project {
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create a project named after its directory
    pub fn from_path(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let resolved = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        let name = resolved.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| resolved.display().to_string());

        Self::new(name, resolved)
    }
}

/// Fully-qualified names of marker implementers, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParcelableList {
    entries: Vec<String>,
}

impl ParcelableList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fqn: impl Into<String>) {
        self.entries.push(fqn.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }
}

/// Statistics about one scan
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Source roots that were walked
    pub roots_scanned: usize,

    /// Archive and external roots that were left out
    pub roots_skipped: usize,

    /// Packages visited
    pub packages: usize,

    /// Compilation units visited
    pub compilation_units: usize,

    /// Type declarations classified, nested ones included
    pub types_visited: usize,

    /// Types found to implement the marker interface
    pub parcelables: usize,
}

impl ScanStats {
    /// Merge another stats instance into this one
    pub fn merge(&mut self, other: &Self) {
        self.roots_scanned += other.roots_scanned;
        self.roots_skipped += other.roots_skipped;
        self.packages += other.packages;
        self.compilation_units += other.compilation_units;
        self.types_visited += other.types_visited;
        self.parcelables += other.parcelables;
    }
}

/// Lifecycle of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationState {
    Idle,
    Scanning,
    Writing,
    Skipped,
    Done,
    Failed,
}

/// What a successful invocation did with the artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The artifact was regenerated
    Written,

    /// Nothing implements the marker; the artifact was left as it was
    Skipped,

    /// Cancellation was requested before the scan finished; nothing was written
    Cancelled,
}

/// Result of a successful invocation
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub project: String,
    pub artifact: PathBuf,
    pub outcome: Outcome,
    pub state: InvocationState,
    pub parcelables: ParcelableList,

    /// SHA-256 of the written content
    pub digest: Option<String>,

    pub stats: ScanStats,

    /// Set when the workspace could not refresh after the write
    pub refresh_warning: Option<String>,
}
