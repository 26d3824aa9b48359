use std::collections::HashSet;
use log::trace;

use crate::error::SourceModelError;

/// Resolved direct supertypes of one type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Supertypes {
    /// Fully-qualified superclass, if known
    pub class: Option<String>,

    /// Fully-qualified direct super-interfaces
    pub interfaces: Vec<String>,
}

impl Supertypes {
    pub fn interfaces<I, S>(interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class: None,
            interfaces: interfaces.into_iter().map(Into::into).collect(),
        }
    }
}

/// Compute every interface `start` implements, directly or through any supertype.
///
/// `direct` resolves the immediate supertypes of a name; types it knows
/// nothing about should yield an empty [`Supertypes`]. Each interface is
/// reported once, in depth-first discovery order.
pub fn interface_closure<F>(start: &str, direct: F) -> Result<Vec<String>, SourceModelError>
where
    F: FnMut(&str) -> Result<Supertypes, SourceModelError>,
{
    let mut walk = ClosureWalk {
        direct,
        found: Vec::new(),
        reported: HashSet::new(),
        expanded: HashSet::new(),
        path: Vec::new(),
    };
    walk.visit(start)?;

    trace!("{} implements {} interfaces", start, walk.found.len());
    Ok(walk.found)
}

struct ClosureWalk<F> {
    direct: F,
    found: Vec<String>,
    reported: HashSet<String>,
    expanded: HashSet<String>,
    path: Vec<String>,
}

impl<F> ClosureWalk<F>
where
    F: FnMut(&str) -> Result<Supertypes, SourceModelError>,
{
    fn visit(&mut self, fqn: &str) -> Result<(), SourceModelError> {
        if self.path.iter().any(|entry| entry == fqn) {
            return Err(SourceModelError::CyclicHierarchy { fqn: fqn.to_string() });
        }
        if !self.expanded.insert(fqn.to_string()) {
            return Ok(());
        }

        self.path.push(fqn.to_string());
        let supertypes = (self.direct)(fqn)?;

        for interface in &supertypes.interfaces {
            if self.reported.insert(interface.clone()) {
                self.found.push(interface.clone());
            }
            self.visit(interface)?;
        }
        if let Some(class) = &supertypes.class {
            self.visit(class)?;
        }

        self.path.pop();
        Ok(())
    }
}
