use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::GenerateError;
use crate::utils::{file_utils, hash_utils};
use super::types::ParcelableList;

/// Fixed warning block at the top of every generated file, blank line included
pub const HEADER: &str = "\
// This file is auto-generated by the
//    'Create Aidl preprocess file for Parcelable classes'
// action. Do not modify!

";

/// What the writer did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The list was empty and the file was not touched
    Skipped,

    /// The file now holds the rendered list
    Written { digest: String },
}

/// Render the full artifact content for a list
pub fn render(parcelables: &ParcelableList) -> String {
    let mut content = String::from(HEADER);
    for fqn in parcelables.iter() {
        content.push_str(&format!("parcelable {};\n", fqn));
    }
    content
}

/// Regenerates the preprocess file from a finished scan
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    path: PathBuf,
}

impl ArtifactWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the artifact with the rendered list; an empty list leaves any existing file alone
    pub fn write(&self, parcelables: &ParcelableList) -> Result<WriteOutcome, GenerateError> {
        if parcelables.is_empty() {
            debug!("No parcelable types, leaving {} untouched", self.path.display());
            return Ok(WriteOutcome::Skipped);
        }

        let content = render(parcelables);
        file_utils::write_atomically(&self.path, &content).map_err(|source| GenerateError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!("Wrote {} parcelable declarations to {}", parcelables.len(), self.path.display());
        Ok(WriteOutcome::Written {
            digest: hash_utils::hash_string(&content),
        })
    }
}
