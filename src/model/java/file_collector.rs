use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::utils::file_utils;

/// Files of one package directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFiles {
    /// Dot-delimited package name; empty for the default package
    pub name: String,

    /// Source files directly inside the package directory, sorted by file name
    pub files: Vec<PathBuf>,
}

/// File collector for finding source files below a source root
#[derive(Debug)]
pub struct FileCollector {
    /// Valid file extensions to collect
    valid_extensions: Vec<String>,
}

impl Default for FileCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl FileCollector {
    /// Create a new file collector for `.java` sources
    pub fn new() -> Self {
        Self {
            valid_extensions: vec!["java".to_string()],
        }
    }

    /// Collect every package below `root` that holds at least one source file.
    ///
    /// Directories whose names are not Java identifiers (e.g. `META-INF`,
    /// `.svn`) cannot be packages and are pruned with their subtrees.
    pub fn collect_packages(&self, root: impl AsRef<Path>) -> io::Result<Vec<PackageFiles>> {
        let root = root.as_ref();
        debug!("Collecting packages from source root: {}", root.display());

        let mut packages = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || is_package_dir(entry));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let files = self.collect_files(entry.path())?;
            if files.is_empty() {
                continue;
            }

            let name = package_name(root, entry.path());
            trace!("Package '{}' has {} files", name, files.len());
            packages.push(PackageFiles { name, files });
        }

        packages.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Collected {} packages from {}", packages.len(), root.display());
        Ok(packages)
    }

    /// Source files directly inside `dir`, sorted by file name
    fn collect_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let extensions: Vec<&str> = self.valid_extensions.iter().map(String::as_str).collect();
            if file_utils::has_any_extension(&path, &extensions) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn is_package_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }
    entry.file_name()
        .to_str()
        .map(is_java_identifier)
        .unwrap_or(false)
}

fn is_java_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

fn package_name(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .map(|relative| {
            relative.components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn collects_packages_sorted_and_skips_non_package_dirs() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let root = temp_dir.path();
        fs::create_dir_all(root.join("com/example/sub"))?;
        fs::create_dir_all(root.join("META-INF"))?;
        fs::create_dir_all(root.join("com/empty"))?;
        fs::write(root.join("Main.java"), "class Main {}")?;
        fs::write(root.join("com/example/B.java"), "class B {}")?;
        fs::write(root.join("com/example/A.java"), "class A {}")?;
        fs::write(root.join("com/example/notes.txt"), "")?;
        fs::write(root.join("com/example/sub/C.java"), "class C {}")?;
        fs::write(root.join("META-INF/Hidden.java"), "class Hidden {}")?;

        let packages = FileCollector::new().collect_packages(root)?;

        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["", "com.example", "com.example.sub"]);
        assert_eq!(packages[1].files, vec![
            root.join("com/example/A.java"),
            root.join("com/example/B.java"),
        ]);
        Ok(())
    }
}
