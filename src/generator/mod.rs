pub mod classifier;
pub mod progress;
pub mod scanner;
pub mod types;
pub mod writer;

use std::path::PathBuf;

use log::{debug, error, info, warn};

use crate::config::Settings;
use crate::error::GenerateError;
use crate::error::SourceModelError;
use crate::model::{ModelLoad, SourceModel};
use crate::workspace::{RefreshDepth, Workspace};

// Re-export the main API for easier access
pub use classifier::Classifier;
pub use progress::{CancellationToken, NullMonitor, ProgressMonitor, ProgressTracker};
pub use scanner::{ScanOutcome, Scanner};
pub use types::{GenerationReport, InvocationState, Outcome, ParcelableList, Project, ScanStats};
pub use writer::{ArtifactWriter, HEADER, WriteOutcome};

/// Tracks the state of one invocation and logs its transitions
#[derive(Debug)]
struct Invocation<'a> {
    project: &'a str,
    state: InvocationState,
}

impl<'a> Invocation<'a> {
    fn new(project: &'a str) -> Self {
        Self {
            project,
            state: InvocationState::Idle,
        }
    }

    fn advance(&mut self, next: InvocationState) {
        debug!("{}: {:?} -> {:?}", self.project, self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: &GenerateError) {
        error!("{}: {:?} -> Failed: {}", self.project, self.state, err);
        self.state = InvocationState::Failed;
    }
}

/// Runs scan, classification and write for a project
pub struct Generator<'a> {
    settings: &'a Settings,
    workspace: &'a dyn Workspace,
    monitor: &'a dyn ProgressMonitor,
}

impl<'a> Generator<'a> {
    pub fn new(settings: &'a Settings, workspace: &'a dyn Workspace, monitor: &'a dyn ProgressMonitor) -> Self {
        Self {
            settings,
            workspace,
            monitor,
        }
    }

    /// Regenerate the preprocess file of `project` from `model`.
    ///
    /// Produces exactly one result: a report (written, skipped or cancelled)
    /// or the error that stopped the invocation. On error the artifact is
    /// left as it was.
    pub fn run(&self, project: &Project, model: &dyn SourceModel) -> Result<GenerationReport, GenerateError> {
        self.run_loading(project, |_| Ok(ModelLoad::Loaded(model)))
    }

    /// Like [`Self::run`], with the model produced by `load` inside the same task.
    ///
    /// A load failure fails the invocation; a cancelled load ends it as
    /// [`Outcome::Cancelled`] without touching the artifact.
    pub fn run_loading<M, F>(&self, project: &Project, load: F) -> Result<GenerationReport, GenerateError>
    where
        M: SourceModel,
        F: FnOnce(&dyn ProgressMonitor) -> Result<ModelLoad<M>, SourceModelError>,
    {
        self.monitor.begin_task(&format!("Creating aidl preprocess file for {}", project.name), 1);
        info!("Generating {} for {}", self.settings.artifact_name, project.name);

        let mut invocation = Invocation::new(&project.name);
        invocation.advance(InvocationState::Scanning);

        let result = match load(self.monitor) {
            Ok(ModelLoad::Loaded(model)) => self.execute(project, &model, &mut invocation),
            Ok(ModelLoad::Cancelled) => Ok(self.cancelled(project, &mut invocation, ScanStats::default())),
            Err(err) => {
                let err = GenerateError::from(err);
                invocation.fail(&err);
                Err(err)
            }
        };

        self.monitor.done();
        result
    }

    fn artifact_path(&self, project: &Project) -> PathBuf {
        project.root.join(&self.settings.artifact_name)
    }

    fn cancelled(&self, project: &Project, invocation: &mut Invocation<'_>, stats: ScanStats) -> GenerationReport {
        invocation.advance(InvocationState::Done);
        GenerationReport {
            project: project.name.clone(),
            artifact: self.artifact_path(project),
            outcome: Outcome::Cancelled,
            state: invocation.state,
            parcelables: ParcelableList::new(),
            digest: None,
            stats,
            refresh_warning: None,
        }
    }

    fn execute(
        &self,
        project: &Project,
        model: &dyn SourceModel,
        invocation: &mut Invocation<'_>,
    ) -> Result<GenerationReport, GenerateError> {
        let writer = ArtifactWriter::new(self.artifact_path(project));
        let mut report = GenerationReport {
            project: project.name.clone(),
            artifact: writer.path().to_path_buf(),
            outcome: Outcome::Skipped,
            state: invocation.state,
            parcelables: ParcelableList::new(),
            digest: None,
            stats: ScanStats::default(),
            refresh_warning: None,
        };

        let scanner = Scanner::new(model, &self.settings.marker_interface, self.monitor);
        let parcelables = match scanner.scan(&mut report.stats) {
            Ok(ScanOutcome::Completed(parcelables)) => parcelables,
            Ok(ScanOutcome::Cancelled) => return Ok(self.cancelled(project, invocation, report.stats)),
            Err(err) => {
                let err = GenerateError::from(err);
                invocation.fail(&err);
                return Err(err);
            }
        };

        if parcelables.is_empty() {
            invocation.advance(InvocationState::Skipped);
        } else {
            invocation.advance(InvocationState::Writing);
            match writer.write(&parcelables) {
                Ok(WriteOutcome::Written { digest }) => {
                    report.outcome = Outcome::Written;
                    report.digest = Some(digest);
                }
                Ok(WriteOutcome::Skipped) => {}
                Err(err) => {
                    invocation.fail(&err);
                    return Err(err);
                }
            }

            // Only the directory holding the artifact needs a fresh look
            let dir = writer.path().parent().unwrap_or(&project.root);
            if let Err(err) = self.workspace.refresh(dir, RefreshDepth::One) {
                let warning = format!("{}: {}", err, err.source);
                warn!("{}: {}", project.name, warning);
                report.refresh_warning = Some(warning);
            }
        }

        self.monitor.worked(1);
        report.parcelables = parcelables;
        invocation.advance(InvocationState::Done);
        report.state = invocation.state;

        info!(
            "{}: {:?}, {} parcelable types in {} units",
            project.name, report.outcome, report.parcelables.len(), report.stats.compilation_units
        );
        Ok(report)
    }
}
