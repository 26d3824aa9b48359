//! Runs one background unit of work per selected project.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use futures::future::join_all;
use indicatif::{MultiProgress, ProgressDrawTarget};
use log::{debug, info};

use crate::config::Settings;
use crate::generator::{
    CancellationToken, GenerationReport, Generator, ProgressMonitor, ProgressTracker, Project,
};
use crate::model::JavaSourceModel;
use crate::workspace::FsWorkspace;

/// Options shared by every project of one run
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Settings file overriding each project's own
    pub config: Option<PathBuf>,

    /// Marker interface overriding the settings
    pub marker: Option<String>,

    /// Draw progress spinners on stderr
    pub show_progress: bool,
}

/// Final status of one project
#[derive(Debug)]
pub struct ProjectResult {
    pub project: Project,
    pub result: Result<GenerationReport>,
}

/// Process every project as an independent blocking task and wait for all of them.
///
/// Results come back in the order the projects were given. Projects share
/// nothing but the cancellation token.
pub async fn run_projects(
    projects: Vec<Project>,
    options: DispatchOptions,
    token: CancellationToken,
) -> Vec<ProjectResult> {
    let multi_progress = if options.show_progress {
        MultiProgress::new()
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    };

    let handles = projects.iter().cloned().map(|project| {
        let options = options.clone();
        let token = token.clone();
        let multi_progress = multi_progress.clone();
        tokio::task::spawn_blocking(move || {
            let tracker = ProgressTracker::new(&multi_progress, token);
            run_project(&project, &options, &tracker)
        })
    });

    let joined = join_all(handles).await;
    debug!("{} project tasks finished", joined.len());

    projects.into_iter()
        .zip(joined)
        .map(|(project, joined)| {
            let result = joined
                .map_err(|err| anyhow!("Task for {} did not complete: {}", project.name, err))
                .and_then(|result| result);
            ProjectResult { project, result }
        })
        .collect()
}

/// Load settings and sources of one project and run the generator on it
pub fn run_project(project: &Project, options: &DispatchOptions, tracker: &ProgressTracker) -> Result<GenerationReport> {
    info!("Processing project {} at {}", project.name, project.root.display());

    let mut settings = match Settings::for_project(&project.root, options.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            tracker.done();
            return Err(err);
        }
    };
    if let Some(marker) = &options.marker {
        settings.marker_interface = marker.clone();
    }

    let workspace = FsWorkspace;
    let generator = Generator::new(&settings, &workspace, tracker);
    generator
        .run_loading(project, |monitor| JavaSourceModel::open(&project.root, &settings, monitor))
        .with_context(|| format!("Aidl preprocess failed for {}", project.name))
}
