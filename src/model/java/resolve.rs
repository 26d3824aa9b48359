use std::collections::BTreeMap;

use crate::model::{TypeArena, TypeId};
use super::parser::Import;

/// Package and imports of one compilation unit
#[derive(Debug, Clone, Default)]
pub struct UnitContext {
    pub package: String,
    pub imports: Vec<Import>,
}

impl UnitContext {
    fn qualify(&self, simple: &str) -> String {
        if self.package.is_empty() {
            simple.to_string()
        } else {
            format!("{}.{}", self.package, simple)
        }
    }
}

/// Resolves type references written in a declaration header to fully-qualified names
pub struct Resolver<'a> {
    pub arena: &'a TypeArena,
    pub context: &'a UnitContext,
    pub known: &'a BTreeMap<String, Vec<String>>,
}

impl Resolver<'_> {
    /// Resolve `name` as written inside the declaration of `from`
    pub fn resolve(&self, from: TypeId, name: &str) -> Option<String> {
        let (first, rest) = match name.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (name, None),
        };

        match (self.resolve_simple(from, first), rest) {
            (Some(base), None) => Some(base),
            (Some(base), Some(rest)) => Some(format!("{}.{}", base, rest)),
            // A leading segment that is not a visible type starts a package name
            (None, Some(_)) => Some(name.to_string()),
            (None, None) => None,
        }
    }

    fn resolve_simple(&self, from: TypeId, simple: &str) -> Option<String> {
        // Enclosing types and their members
        let mut current = Some(from);
        while let Some(id) = current {
            let decl = self.arena.get(id)?;
            if decl.name == simple {
                return Some(decl.fqn.clone());
            }
            let member = decl.nested.iter()
                .filter_map(|nested| self.arena.get(*nested))
                .find(|nested| nested.name == simple);
            if let Some(member) = member {
                return Some(member.fqn.clone());
            }
            current = decl.enclosing;
        }

        // Single-type imports
        let suffix = format!(".{}", simple);
        let imported = self.context.imports.iter()
            .find(|import| !import.on_demand && (import.name.ends_with(&suffix) || import.name == simple));
        if let Some(import) = imported {
            return Some(import.name.clone());
        }

        // Same package
        let local = self.context.qualify(simple);
        if self.arena.lookup(&local).is_some() {
            return Some(local);
        }

        // On-demand imports, then the implicit java.lang import
        self.context.imports.iter()
            .filter(|import| import.on_demand)
            .map(|import| format!("{}.{}", import.name, simple))
            .chain(std::iter::once(format!("java.lang.{}", simple)))
            .find(|candidate| self.arena.lookup(candidate).is_some() || self.known.contains_key(candidate))
    }
}
