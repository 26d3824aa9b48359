use std::collections::HashMap;
use serde::Serialize;

/// Index of a declaration inside a [`TypeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The flavour of a type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl TypeKind {
    /// Map a declaration keyword to its kind
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "class" => Some(Self::Class),
            "interface" => Some(Self::Interface),
            "enum" => Some(Self::Enum),
            "record" => Some(Self::Record),
            _ => None,
        }
    }
}

/// A named type together with its directly nested member types
#[derive(Debug, Clone, Serialize)]
pub struct TypeDeclaration {
    /// Simple name of the type
    pub name: String,

    /// Dot-delimited fully-qualified name, enclosing types included
    pub fqn: String,

    /// Declaration keyword
    pub kind: TypeKind,

    /// Directly enclosing type, if this is a member type
    pub enclosing: Option<TypeId>,

    /// Directly nested member types, in declaration order
    pub nested: Vec<TypeId>,

    /// Superclass as written in the source, if any
    pub super_class: Option<String>,

    /// Directly implemented (or, for interfaces, extended) interfaces as written
    pub super_interfaces: Vec<String>,
}

impl TypeDeclaration {
    pub fn new(name: impl Into<String>, fqn: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            fqn: fqn.into(),
            kind,
            enclosing: None,
            nested: Vec::new(),
            super_class: None,
            super_interfaces: Vec::new(),
        }
    }
}

/// Flat storage for a tree of declarations.
///
/// Children are referenced by id, so the tree can be walked with an
/// explicit stack regardless of nesting depth.
#[derive(Debug, Default, Clone)]
pub struct TypeArena {
    nodes: Vec<TypeDeclaration>,
    by_fqn: HashMap<String, TypeId>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a declaration and link it to its enclosing type
    pub fn alloc(&mut self, mut declaration: TypeDeclaration, enclosing: Option<TypeId>) -> TypeId {
        let id = TypeId(self.nodes.len());
        declaration.enclosing = enclosing;

        // First declaration of a name wins lookups, like a classpath
        self.by_fqn.entry(declaration.fqn.clone()).or_insert(id);
        self.nodes.push(declaration);

        if let Some(parent) = enclosing {
            self.nodes[parent.0].nested.push(id);
        }
        id
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeDeclaration> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: TypeId) -> Option<&mut TypeDeclaration> {
        self.nodes.get_mut(id.0)
    }

    /// Find a declaration by fully-qualified name
    pub fn lookup(&self, fqn: &str) -> Option<TypeId> {
        self.by_fqn.get(fqn).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
