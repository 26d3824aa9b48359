use std::path::{Component, Path};

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SourceModelError;
use crate::model::SourceRoot;
use crate::utils::file_utils;

/// Eclipse-style classpath file in the project root
pub const CLASSPATH_FILE: &str = ".classpath";

static ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<classpathentry\b([^>]*?)/?>").expect("classpath entry pattern is valid")
});

static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_]+)\s*=\s*"([^"]*)""#).expect("attribute pattern is valid")
});

/// One `<classpathentry>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClasspathEntry {
    pub kind: String,
    pub path: String,
}

/// Extract classpath entries from the content of a `.classpath` file
pub fn parse_entries(content: &str) -> Vec<ClasspathEntry> {
    let mut entries = Vec::new();

    for cap in ENTRY_RE.captures_iter(content) {
        let mut kind = None;
        let mut path = None;
        for attribute in ATTRIBUTE_RE.captures_iter(&cap[1]) {
            match &attribute[1] {
                "kind" => kind = Some(attribute[2].to_string()),
                "path" => path = Some(attribute[2].to_string()),
                _ => {}
            }
        }
        if let (Some(kind), Some(path)) = (kind, path) {
            entries.push(ClasspathEntry { kind, path });
        }
    }

    entries
}

/// Classify a declared classpath location relative to the project.
///
/// Returns `None` for entries that are not roots (containers, output, variables).
pub fn classify(project_root: &Path, kind: &str, declared: &str) -> Option<SourceRoot> {
    match kind {
        "src" if declared.starts_with('/') => {
            // Workspace-relative reference to another project
            let workspace = project_root.parent().unwrap_or(project_root);
            let path = workspace.join(declared.trim_start_matches('/'));
            Some(SourceRoot::source(path).external())
        }
        "src" | "lib" => {
            let declared_path = Path::new(declared);
            let external = declared_path.is_absolute() || escapes(declared_path);
            let path = if declared_path.is_absolute() {
                declared_path.to_path_buf()
            } else {
                project_root.join(declared_path)
            };

            let root = if is_archive(&path) {
                SourceRoot::archive(path)
            } else {
                SourceRoot::source(path)
            };
            Some(if external { root.external() } else { root })
        }
        _ => None,
    }
}

/// Resolve the roots of a project: from `.classpath` when present, else the configured defaults
pub fn project_roots(project_root: &Path, defaults: &[String]) -> Result<Vec<SourceRoot>, SourceModelError> {
    let classpath = project_root.join(CLASSPATH_FILE);

    let roots = if classpath.is_file() {
        debug!("Reading source roots from {}", classpath.display());
        let content = file_utils::read_file_to_string(&classpath).map_err(|source| SourceModelError::Io {
            path: classpath.clone(),
            source,
        })?;

        let entries = parse_entries(&content);
        if entries.is_empty() && content.contains("<classpathentry") {
            return Err(SourceModelError::Classpath {
                path: classpath,
                message: "no readable classpathentry elements".to_string(),
            });
        }
        entries.iter()
            .filter_map(|entry| classify(project_root, &entry.kind, &entry.path))
            .collect::<Vec<_>>()
    } else {
        debug!("No {} in {}, using configured roots", CLASSPATH_FILE, project_root.display());
        defaults.iter()
            .filter_map(|declared| classify(project_root, "src", declared))
            .filter(|root| {
                let present = root.is_archive() || root.path.is_dir();
                if !present {
                    debug!("Skipping missing source root {}", root.path.display());
                }
                present
            })
            .collect()
    };

    for root in roots.iter().filter(|root| !root.is_archive() && !root.path.is_dir()) {
        warn!("Source root {} does not exist", root.path.display());
    }

    Ok(roots)
}

fn is_archive(path: &Path) -> bool {
    file_utils::has_any_extension(path, &["jar", "zip"])
}

/// Whether a relative path climbs out of the directory it is joined to
fn escapes(path: &Path) -> bool {
    let mut level = 0i32;
    for component in path.components() {
        match component {
            Component::ParentDir => level -= 1,
            Component::Normal(_) => level += 1,
            _ => {}
        }
        if level < 0 {
            return true;
        }
    }
    false
}
