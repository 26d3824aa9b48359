use log::trace;

use crate::error::SourceModelError;
use crate::model::{SourceModel, TypeId};
use super::progress::ProgressMonitor;
use super::types::{ParcelableList, ScanStats};

/// Whether a walk ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Completed,
    Cancelled,
}

/// Decides which declarations implement the marker interface
pub struct Classifier<'a> {
    model: &'a dyn SourceModel,
    marker: &'a str,
}

impl<'a> Classifier<'a> {
    pub fn new(model: &'a dyn SourceModel, marker: &'a str) -> Self {
        Self { model, marker }
    }

    /// Classify `root` and every type nested in it, pre-order.
    ///
    /// An outer type is checked before its members and members keep their
    /// declaration order. The first hierarchy failure aborts the walk.
    pub fn classify(
        &self,
        root: TypeId,
        found: &mut ParcelableList,
        stats: &mut ScanStats,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Walk, SourceModelError> {
        let mut pending = vec![root];

        while let Some(id) = pending.pop() {
            if monitor.is_cancelled() {
                return Ok(Walk::Cancelled);
            }

            let declaration = self.model.declaration(id)?;
            stats.types_visited += 1;

            let interfaces = self.model.super_interface_closure(id)?;
            if interfaces.iter().any(|interface| interface == self.marker) {
                trace!("{} implements {}", declaration.fqn, self.marker);
                found.push(declaration.fqn.clone());
                stats.parcelables += 1;
            }

            pending.extend(declaration.nested.iter().rev().copied());
        }

        Ok(Walk::Completed)
    }
}
