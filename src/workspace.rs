//! Host-side view of the files the generator touches.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::WorkspaceRefreshError;

/// How far below the refreshed directory the host should look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDepth {
    /// The directory itself
    Zero,

    /// The directory and its immediate children
    One,

    /// The whole subtree
    Infinite,
}

/// Collaborator notified after the artifact changed on disk
pub trait Workspace {
    fn refresh(&self, dir: &Path, depth: RefreshDepth) -> Result<(), WorkspaceRefreshError>;
}

/// Plain filesystem workspace.
///
/// Refreshing flushes the directory entry so the rename of the artifact is
/// durable, then re-reads the directory listing to the requested depth.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWorkspace;

impl Workspace for FsWorkspace {
    fn refresh(&self, dir: &Path, depth: RefreshDepth) -> Result<(), WorkspaceRefreshError> {
        let wrap = |source: std::io::Error| WorkspaceRefreshError {
            dir: dir.to_path_buf(),
            source,
        };

        sync_dir(dir).map_err(wrap)?;

        let visible = match depth {
            RefreshDepth::Zero => {
                fs::metadata(dir).map_err(wrap)?;
                1
            }
            RefreshDepth::One => fs::read_dir(dir).map_err(wrap)?.count(),
            RefreshDepth::Infinite => walkdir::WalkDir::new(dir)
                .into_iter()
                .map(|entry| entry.map_err(|err| wrap(err.into())))
                .collect::<Result<Vec<_>, _>>()?
                .len(),
        };

        debug!("Refreshed {} ({} entries, depth {:?})", dir.display(), visible, depth);
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
