use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{p4, paths, project, workspace};

use super::context::SessionContext;
use super::types::{DetectionReport, ProjectSource, ValidationError};

/// Outcome of one detection pass: the session state plus a report suitable
/// for display.
#[derive(Debug)]
pub struct Detection {
    pub context: SessionContext,
    pub report: DetectionReport,
}

/// Run the full detection pass: locate the project, enumerate workspaces,
/// and resolve the most likely workspace root.
///
/// `project_override` skips the upward search but is validated against the
/// project marker. Detection itself never fails; only an invalid override
/// is an error.
pub fn detect(start_dir: &Path, project_override: Option<&Path>) -> Result<Detection> {
    info!(start = %start_dir.display(), "detect:start");

    let mut project_source = None;
    let mut ignored_markers: Vec<PathBuf> = Vec::new();

    let mut project_root = match project_override {
        Some(dir) => {
            if !project::has_project_marker(dir) {
                return Err(ValidationError::NotAProject(dir.to_path_buf()).into());
            }
            project_source = Some(ProjectSource::Override);
            Some(paths::normalize(dir))
        }
        None => {
            let found = project::find_project_root(start_dir);
            if found.is_some() {
                project_source = Some(ProjectSource::AncestorSearch);
            }
            found
        }
    };

    let workspaces = workspace::enumerate();

    // No project near the starting directory; look inside the first
    // enumerated workspace instead.
    if project_root.is_none() {
        if let Some(first) = workspaces.first() {
            if let Some(search) = project::find_project_in_workspace(&first.root) {
                info!(root = %search.root.display(), "detect:project found in workspace");
                project_root = Some(search.root);
                project_source = Some(ProjectSource::WorkspaceSearch);
                ignored_markers = search.ignored;
            }
        }
    }

    let resolved = workspace::resolve(project_root.as_deref(), &workspaces);

    let context = SessionContext {
        project_root,
        workspaces,
        resolved,
    };
    let report = DetectionReport {
        project_root: context.project_root.clone(),
        project_source,
        ignored_markers,
        workspaces: context.workspaces.clone(),
        entries: context.entries(),
        resolved: context.resolved.clone(),
        p4_available: p4::is_available(),
    };

    info!(
        project = ?report.project_root,
        workspaces = report.workspaces.len(),
        resolved = ?report.resolved.as_ref().map(|r| r.root.clone()),
        "detect:completed"
    );

    Ok(Detection { context, report })
}
