use log::{debug, info};

use crate::error::SourceModelError;
use crate::model::{SourceModel, SourceRoot};
use super::classifier::{Classifier, Walk};
use super::progress::ProgressMonitor;
use super::types::{ParcelableList, ScanStats};

/// How a scan ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every type of every scanned root was classified
    Completed(ParcelableList),

    /// Cancellation was requested; partial results are discarded
    Cancelled,
}

/// Walks the project's own source roots and feeds every top-level type to the classifier
pub struct Scanner<'a> {
    model: &'a dyn SourceModel,
    classifier: Classifier<'a>,
    monitor: &'a dyn ProgressMonitor,
}

impl<'a> Scanner<'a> {
    pub fn new(model: &'a dyn SourceModel, marker: &'a str, monitor: &'a dyn ProgressMonitor) -> Self {
        Self {
            model,
            classifier: Classifier::new(model, marker),
            monitor,
        }
    }

    /// Scan roots, packages, units and types in model order.
    ///
    /// Archive and external roots are never entered.
    pub fn scan(&self, stats: &mut ScanStats) -> Result<ScanOutcome, SourceModelError> {
        let mut found = ParcelableList::new();

        for root in self.model.source_roots()? {
            if root.is_archive() || root.is_external() {
                debug!("Skipping {} root {}", describe(&root), root.path.display());
                stats.roots_skipped += 1;
                continue;
            }
            debug!("Scanning source root {}", root.path.display());
            stats.roots_scanned += 1;

            for package in self.model.packages(&root)? {
                stats.packages += 1;

                for unit in self.model.compilation_units(&package)? {
                    if self.monitor.is_cancelled() {
                        info!("Scan cancelled after {} compilation units", stats.compilation_units);
                        return Ok(ScanOutcome::Cancelled);
                    }
                    self.monitor.sub_task(&unit.path.display().to_string());
                    stats.compilation_units += 1;

                    for id in self.model.types(&unit)? {
                        let walk = self.classifier.classify(id, &mut found, stats, self.monitor)?;
                        if walk == Walk::Cancelled {
                            info!("Scan cancelled in {}", unit.path.display());
                            return Ok(ScanOutcome::Cancelled);
                        }
                    }
                }
            }
        }

        debug!(
            "Scanned {} types in {} units, {} implement the marker",
            stats.types_visited, stats.compilation_units, found.len()
        );
        Ok(ScanOutcome::Completed(found))
    }
}

fn describe(root: &SourceRoot) -> &'static str {
    match (root.is_archive(), root.is_external()) {
        (true, true) => "external archive",
        (true, false) => "archive",
        _ => "external",
    }
}
