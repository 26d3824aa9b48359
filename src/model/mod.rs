pub mod arena;
pub mod hierarchy;
pub mod java;
pub mod memory;

use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::error::SourceModelError;

// Re-export the main API for easier access
pub use arena::{TypeArena, TypeDeclaration, TypeId, TypeKind};
pub use java::JavaSourceModel;
pub use memory::InMemorySourceModel;

/// Kind of content a source root points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootKind {
    /// A directory of source files
    Source,

    /// A packaged archive (jar, zip)
    Archive,
}

/// One compilation root of a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceRoot {
    /// Location of the root on disk (or its declared path for archives)
    pub path: PathBuf,

    /// Whether this root is a directory or an archive
    pub kind: RootKind,

    /// Whether the root lives outside the project (linked folder, other project)
    pub external: bool,
}

impl SourceRoot {
    /// Create a source directory root inside the project
    pub fn source(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind: RootKind::Source,
            external: false,
        }
    }

    /// Create an archive root
    pub fn archive(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            kind: RootKind::Archive,
            external: false,
        }
    }

    /// Mark the root as external to the project
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    pub fn is_archive(&self) -> bool {
        self.kind == RootKind::Archive
    }

    pub fn is_external(&self) -> bool {
        self.external
    }
}

/// A package inside a source root; the empty name is the default package
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Package {
    pub root: PathBuf,
    pub name: String,
}

/// A single source file belonging to a package
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompilationUnit {
    pub path: PathBuf,
    pub package: String,
}

/// Read-only queries the generator runs against a project's sources.
///
/// Implementations own the parsed view of the project. All queries are
/// synchronous; a failure in any of them aborts the scan that issued it.
pub trait SourceModel {
    /// Every root on the project's classpath, archives and external roots included
    fn source_roots(&self) -> Result<Vec<SourceRoot>, SourceModelError>;

    /// Packages contained in a root
    fn packages(&self, root: &SourceRoot) -> Result<Vec<Package>, SourceModelError>;

    /// Compilation units contained in a package
    fn compilation_units(&self, package: &Package) -> Result<Vec<CompilationUnit>, SourceModelError>;

    /// Top-level types declared in a compilation unit, in declaration order
    fn types(&self, unit: &CompilationUnit) -> Result<Vec<TypeId>, SourceModelError>;

    /// Look up a declaration by id
    fn declaration(&self, id: TypeId) -> Result<&TypeDeclaration, SourceModelError>;

    /// Fully-qualified names of every interface the type implements, directly or inherited
    fn super_interface_closure(&self, id: TypeId) -> Result<Vec<String>, SourceModelError>;
}

impl<T: SourceModel + ?Sized> SourceModel for &T {
    fn source_roots(&self) -> Result<Vec<SourceRoot>, SourceModelError> {
        (**self).source_roots()
    }

    fn packages(&self, root: &SourceRoot) -> Result<Vec<Package>, SourceModelError> {
        (**self).packages(root)
    }

    fn compilation_units(&self, package: &Package) -> Result<Vec<CompilationUnit>, SourceModelError> {
        (**self).compilation_units(package)
    }

    fn types(&self, unit: &CompilationUnit) -> Result<Vec<TypeId>, SourceModelError> {
        (**self).types(unit)
    }

    fn declaration(&self, id: TypeId) -> Result<&TypeDeclaration, SourceModelError> {
        (**self).declaration(id)
    }

    fn super_interface_closure(&self, id: TypeId) -> Result<Vec<String>, SourceModelError> {
        (**self).super_interface_closure(id)
    }
}

/// Result of loading a model that may be interrupted
#[derive(Debug)]
pub enum ModelLoad<M> {
    Loaded(M),

    /// Cancellation was requested before every source was read
    Cancelled,
}
