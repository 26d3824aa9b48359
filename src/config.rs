use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

/// Interface whose implementers are listed in the generated file
pub const PARCELABLE_INTERFACE: &str = "android.os.Parcelable";

/// Name of the generated file in the project root
pub const PROJECT_AIDL: &str = "project.aidl";

/// Per-project settings file looked up in the project root
pub const SETTINGS_FILE: &str = "aidl-preprocess.toml";

/// Configuration options for one generator invocation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Fully-qualified name of the marker interface
    pub marker_interface: String,

    /// File name of the generated artifact, relative to the project root
    pub artifact_name: String,

    /// Source roots used when the project has no `.classpath`
    pub source_roots: Vec<String>,

    /// Fail when a supertype name cannot be resolved instead of ignoring it
    pub strict_resolution: bool,

    /// Interfaces of library types that are not part of the project sources
    pub known_supertypes: BTreeMap<String, Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            marker_interface: PARCELABLE_INTERFACE.to_string(),
            artifact_name: PROJECT_AIDL.to_string(),
            source_roots: vec!["src".to_string(), "gen".to_string()],
            strict_resolution: false,
            known_supertypes: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse settings")
    }

    /// Load settings from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading settings from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Settings for a project: an explicit file wins, then the project's own file, then defaults
    pub fn for_project(project_root: impl AsRef<Path>, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = project_root.as_ref().join(SETTINGS_FILE);
        if local.is_file() {
            Self::from_file(local)
        } else {
            Ok(Self::default())
        }
    }
}
