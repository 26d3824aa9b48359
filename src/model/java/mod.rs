mod classpath;
mod file_collector;
mod parser;
mod resolve;

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, trace, warn};

use crate::config::Settings;
use crate::error::SourceModelError;
use crate::generator::ProgressMonitor;
use crate::utils::file_utils;
use super::hierarchy::{self, Supertypes};
use super::{CompilationUnit, ModelLoad, Package, SourceModel, SourceRoot, TypeArena, TypeDeclaration, TypeId};

// Re-export from submodules
pub use classpath::CLASSPATH_FILE;
pub use parser::{Import, ParseError, ParsedType, ParsedUnit, parse_source};

use file_collector::{FileCollector, PackageFiles};
use resolve::{Resolver, UnitContext};

/// Source model backed by the `.java` files of a project directory.
///
/// All non-archive roots that exist on disk are parsed up front, external
/// ones included so their types take part in name resolution.
#[derive(Debug)]
pub struct JavaSourceModel {
    roots: Vec<SourceRoot>,
    packages: HashMap<PathBuf, Vec<Package>>,
    units: HashMap<Package, Vec<CompilationUnit>>,
    unit_types: HashMap<PathBuf, Vec<TypeId>>,
    arena: TypeArena,
    contexts: Vec<UnitContext>,
    type_units: Vec<usize>,
    known_supertypes: BTreeMap<String, Vec<String>>,
    strict_resolution: bool,
}

impl JavaSourceModel {
    /// Parse the sources of the project at `project_root`.
    ///
    /// `monitor` is checked before each compilation unit is read; a
    /// cancelled load returns [`ModelLoad::Cancelled`] without parsing the rest.
    pub fn open(
        project_root: impl AsRef<Path>,
        settings: &Settings,
        monitor: &dyn ProgressMonitor,
    ) -> Result<ModelLoad<Self>, SourceModelError> {
        let project_root = project_root.as_ref();
        if !project_root.is_dir() {
            return Err(SourceModelError::Io {
                path: project_root.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "project directory does not exist"),
            });
        }
        info!("Loading Java sources of {}", project_root.display());

        let roots = classpath::project_roots(project_root, &settings.source_roots)?;
        let mut model = Self {
            roots: roots.clone(),
            packages: HashMap::new(),
            units: HashMap::new(),
            unit_types: HashMap::new(),
            arena: TypeArena::new(),
            contexts: Vec::new(),
            type_units: Vec::new(),
            known_supertypes: settings.known_supertypes.clone(),
            strict_resolution: settings.strict_resolution,
        };

        let collector = FileCollector::new();
        for root in roots.iter().filter(|root| !root.is_archive() && root.path.is_dir()) {
            if let ModelLoad::Cancelled = model.load_root(&collector, root, monitor)? {
                info!("Loading of {} cancelled", project_root.display());
                return Ok(ModelLoad::Cancelled);
            }
        }

        info!("Loaded {} types from {} roots", model.arena.len(), model.roots.len());
        Ok(ModelLoad::Loaded(model))
    }

    fn load_root(
        &mut self,
        collector: &FileCollector,
        root: &SourceRoot,
        monitor: &dyn ProgressMonitor,
    ) -> Result<ModelLoad<()>, SourceModelError> {
        let package_files = collector.collect_packages(&root.path).map_err(|source| SourceModelError::Io {
            path: root.path.clone(),
            source,
        })?;

        let mut packages = Vec::with_capacity(package_files.len());
        for PackageFiles { name, files } in package_files {
            let package = Package {
                root: root.path.clone(),
                name,
            };

            let mut units = Vec::with_capacity(files.len());
            for file in files {
                if monitor.is_cancelled() {
                    return Ok(ModelLoad::Cancelled);
                }
                units.push(self.load_unit(&package, file)?);
            }
            self.units.insert(package.clone(), units);
            packages.push(package);
        }

        self.packages.insert(root.path.clone(), packages);
        Ok(ModelLoad::Loaded(()))
    }

    fn load_unit(&mut self, package: &Package, path: PathBuf) -> Result<CompilationUnit, SourceModelError> {
        debug!("Parsing {}", path.display());

        let content = file_utils::read_file_to_string(&path).map_err(|source| SourceModelError::Io {
            path: path.clone(),
            source,
        })?;
        let parsed = parse_source(&content).map_err(|err| SourceModelError::Parse {
            path: path.clone(),
            line: err.line,
            message: err.message,
        })?;

        let declared = parsed.package.clone().unwrap_or_default();
        if declared != package.name {
            warn!(
                "{} declares package '{}' but lives in '{}'",
                path.display(), declared, package.name
            );
        }

        let context_index = self.contexts.len();
        self.contexts.push(UnitContext {
            package: package.name.clone(),
            imports: parsed.imports,
        });

        let top_level = self.register_types(&package.name, parsed.types, context_index);
        self.unit_types.insert(path.clone(), top_level);

        Ok(CompilationUnit {
            path,
            package: package.name.clone(),
        })
    }

    /// Add the declaration trees of one unit to the arena, returning the top-level ids
    fn register_types(&mut self, package: &str, types: Vec<ParsedType>, context_index: usize) -> Vec<TypeId> {
        let mut top_level = Vec::with_capacity(types.len());
        let mut pending: Vec<(ParsedType, Option<TypeId>)> =
            types.into_iter().rev().map(|parsed| (parsed, None)).collect();

        while let Some((parsed, enclosing)) = pending.pop() {
            let prefix = match enclosing.and_then(|id| self.arena.get(id)) {
                Some(outer) => outer.fqn.clone(),
                None => package.to_string(),
            };
            let fqn = if prefix.is_empty() {
                parsed.name.clone()
            } else {
                format!("{}.{}", prefix, parsed.name)
            };

            if self.arena.lookup(&fqn).is_some() {
                warn!("Duplicate type {}; the first declaration is used for resolution", fqn);
            }

            let mut declaration = TypeDeclaration::new(parsed.name, fqn, parsed.kind);
            declaration.super_class = parsed.super_class;
            declaration.super_interfaces = parsed.super_interfaces;

            let id = self.arena.alloc(declaration, enclosing);
            self.type_units.push(context_index);
            if enclosing.is_none() {
                top_level.push(id);
            }

            pending.extend(parsed.members.into_iter().rev().map(|member| (member, Some(id))));
        }

        top_level
    }

    fn direct_supertypes(&self, fqn: &str) -> Result<Supertypes, SourceModelError> {
        let Some(id) = self.arena.lookup(fqn) else {
            let interfaces = self.known_supertypes.get(fqn).cloned().unwrap_or_default();
            return Ok(Supertypes::interfaces(interfaces));
        };

        let decl = self.declaration(id)?;
        let context = self.type_units.get(id.index())
            .and_then(|index| self.contexts.get(*index))
            .ok_or(SourceModelError::UnknownType(id))?;
        let resolver = Resolver {
            arena: &self.arena,
            context,
            known: &self.known_supertypes,
        };

        let mut supertypes = Supertypes::default();
        if let Some(name) = &decl.super_class {
            supertypes.class = self.resolve_or_skip(&resolver, id, name)?;
        }
        for name in &decl.super_interfaces {
            if let Some(interface) = self.resolve_or_skip(&resolver, id, name)? {
                supertypes.interfaces.push(interface);
            }
        }
        Ok(supertypes)
    }

    fn resolve_or_skip(&self, resolver: &Resolver<'_>, from: TypeId, name: &str) -> Result<Option<String>, SourceModelError> {
        match resolver.resolve(from, name) {
            Some(fqn) => {
                trace!("Resolved {} to {}", name, fqn);
                Ok(Some(fqn))
            }
            None if self.strict_resolution => Err(SourceModelError::UnresolvedType {
                name: name.to_string(),
                referenced_from: self.declaration(from)?.fqn.clone(),
            }),
            None => {
                debug!("Ignoring unresolvable supertype {} of {}", name, self.declaration(from)?.fqn);
                Ok(None)
            }
        }
    }
}

impl SourceModel for JavaSourceModel {
    fn source_roots(&self) -> Result<Vec<SourceRoot>, SourceModelError> {
        Ok(self.roots.clone())
    }

    fn packages(&self, root: &SourceRoot) -> Result<Vec<Package>, SourceModelError> {
        Ok(self.packages.get(&root.path).cloned().unwrap_or_default())
    }

    fn compilation_units(&self, package: &Package) -> Result<Vec<CompilationUnit>, SourceModelError> {
        Ok(self.units.get(package).cloned().unwrap_or_default())
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
