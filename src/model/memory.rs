use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::error::SourceModelError;
use super::hierarchy::{self, Supertypes};
use super::{CompilationUnit, Package, SourceModel, SourceRoot, TypeArena, TypeDeclaration, TypeId, TypeKind};

/// A source model assembled by hand.
///
/// Supertypes are given as fully-qualified names. Useful for exercising the
/// generator without touching the filesystem, and for hosts that already
/// have their own symbol tables.
#[derive(Debug, Default)]
pub struct InMemorySourceModel {
    roots: Vec<SourceRoot>,
    packages: Vec<Package>,
    units: Vec<(PathBuf, CompilationUnit)>,
    unit_types: HashMap<PathBuf, Vec<TypeId>>,
    arena: TypeArena,
    externals: HashMap<String, Supertypes>,
    unresolvable: HashSet<TypeId>,
}

impl InMemorySourceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root and return it for use with [`Self::add_unit`]
    pub fn add_root(&mut self, root: SourceRoot) -> SourceRoot {
        self.roots.push(root.clone());
        root
    }

    /// Register a compilation unit in `package` under `root`
    pub fn add_unit(&mut self, root: &SourceRoot, package: &str, file_name: &str) -> CompilationUnit {
        let package_entry = Package {
            root: root.path.clone(),
            name: package.to_string(),
        };
        if !self.packages.contains(&package_entry) {
            self.packages.push(package_entry);
        }

        let mut path = root.path.clone();
        path.extend(package.split('.').filter(|segment| !segment.is_empty()));
        path.push(file_name);

        let unit = CompilationUnit {
            path,
            package: package.to_string(),
        };
        self.units.push((root.path.clone(), unit.clone()));
        unit
    }

    /// Declare a top-level class in `unit` implementing the given interfaces
    pub fn add_type(&mut self, unit: &CompilationUnit, name: &str, interfaces: &[&str]) -> TypeId {
        let fqn = if unit.package.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", unit.package, name)
        };
        let id = self.alloc(name, fqn, interfaces, None);
        self.unit_types.entry(unit.path.clone()).or_default().push(id);
        id
    }

    /// Declare a member class of `outer`
    pub fn add_nested(&mut self, outer: TypeId, name: &str, interfaces: &[&str]) -> TypeId {
        let fqn = match self.arena.get(outer) {
            Some(decl) => format!("{}.{}", decl.fqn, name),
            None => name.to_string(),
        };
        self.alloc(name, fqn, interfaces, Some(outer))
    }

    /// Set the superclass of a declared type
    pub fn set_super_class(&mut self, id: TypeId, super_class: &str) {
        if let Some(decl) = self.arena.get_mut(id) {
            decl.super_class = Some(super_class.to_string());
        }
    }

    /// Describe a type that is not declared in any unit, e.g. one from a library
    pub fn add_external(&mut self, fqn: &str, supertypes: Supertypes) {
        self.externals.insert(fqn.to_string(), supertypes);
    }

    /// Make hierarchy resolution fail whenever `id` is reached
    pub fn fail_resolution(&mut self, id: TypeId) {
        self.unresolvable.insert(id);
    }

    fn alloc(&mut self, name: &str, fqn: String, interfaces: &[&str], enclosing: Option<TypeId>) -> TypeId {
        let mut decl = TypeDeclaration::new(name, fqn, TypeKind::Class);
        decl.super_interfaces = interfaces.iter().map(|i| i.to_string()).collect();
        self.arena.alloc(decl, enclosing)
    }

    fn direct_supertypes(&self, fqn: &str) -> Result<Supertypes, SourceModelError> {
        let Some(id) = self.arena.lookup(fqn) else {
            return Ok(self.externals.get(fqn).cloned().unwrap_or_default());
        };
        if self.unresolvable.contains(&id) {
            return Err(SourceModelError::UnresolvedType {
                name: fqn.to_string(),
                referenced_from: fqn.to_string(),
            });
        }

        let decl = self.declaration(id)?;
        Ok(Supertypes {
            class: decl.super_class.clone(),
            interfaces: decl.super_interfaces.clone(),
        })
    }
}

impl SourceModel for InMemorySourceModel {
    fn source_roots(&self) -> Result<Vec<SourceRoot>, SourceModelError> {
        Ok(self.roots.clone())
    }

    fn packages(&self, root: &SourceRoot) -> Result<Vec<Package>, SourceModelError> {
        Ok(self.packages.iter()
            .filter(|package| package.root == root.path)
            .cloned()
            .collect())
    }

    fn compilation_units(&self, package: &Package) -> Result<Vec<CompilationUnit>, SourceModelError> {
        Ok(self.units.iter()
            .filter(|(root, unit)| *root == package.root && unit.package == package.name)
            .map(|(_, unit)| unit.clone())
            .collect())
    }

    fn types(&self, unit: &CompilationUnit) -> Result<Vec<TypeId>, SourceModelError> {
        Ok(self.unit_types.get(&unit.path).cloned().unwrap_or_default())
    }

    fn declaration(&self, id: TypeId) -> Result<&TypeDeclaration, SourceModelError> {
        self.arena.get(id).ok_or(SourceModelError::UnknownType(id))
    }

    fn super_interface_closure(&self, id: TypeId) -> Result<Vec<String>, SourceModelError> {
        let fqn = self.declaration(id)?.fqn.clone();
        hierarchy::interface_closure(&fqn, |name| self.direct_supertypes(name))
    }
}
