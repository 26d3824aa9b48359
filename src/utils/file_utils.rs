use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::{debug, trace};
use tempfile::NamedTempFile;

/// Check if a file has a specific extension
pub fn has_extension(path: impl AsRef<Path>, extension: &str) -> bool {
    let path = path.as_ref();
    if let Some(ext) = path.extension() {
        if let Some(ext_str) = ext.to_str() {
            return ext_str.eq_ignore_ascii_case(extension);
        }
    }
    false
}

/// Check if a file has one of the specified extensions
pub fn has_any_extension(path: impl AsRef<Path>, extensions: &[&str]) -> bool {
    extensions.iter().any(|ext| has_extension(path.as_ref(), ext))
}

/// Read a file to string
pub fn read_file_to_string(path: impl AsRef<Path>) -> io::Result<String> {
    let path = path.as_ref();
    trace!("Reading {}", path.display());
    fs::read_to_string(path)
}

/// Replace the content of `path` in one step.
///
/// The content goes to a temporary file in the same directory which is then
/// renamed over the target, so readers never observe a half-written file.
pub fn write_atomically(path: impl AsRef<Path>, content: &str) -> io::Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    match fs::metadata(path) {
        Ok(existing) => temp.as_file().set_permissions(existing.permissions())?,
        Err(_) => set_default_permissions(temp.as_file())?,
    }
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

// Temporary files are created owner-only; a new artifact gets regular file permissions
#[cfg(unix)]
fn set_default_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}
