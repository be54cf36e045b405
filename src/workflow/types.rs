use serde::Serialize;
use std::path::PathBuf;

use crate::engine_ini::PatchOutcome;
use crate::p4::Workspace;
use crate::workspace::{ResolvedWorkspace, SelectorEntry};

/// User input that fails validation before any side effect happens.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("No Unreal project root is set")]
    MissingProjectRoot,
    #[error("P4 workspace root must not be empty")]
    EmptyWorkspace,
    #[error("Directory does not contain a .uproject file: {0}")]
    NotAProject(PathBuf),
}

/// How the project root was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectSource {
    /// Supplied explicitly by the user.
    Override,
    /// Upward search from the starting directory.
    AncestorSearch,
    /// Bounded downward search inside an enumerated workspace.
    WorkspaceSearch,
}

/// Everything one detection pass learned, for display or `--json` output.
#[derive(Debug, Serialize)]
pub struct DetectionReport {
    pub project_root: Option<PathBuf>,
    pub project_source: Option<ProjectSource>,
    /// Marker files found but not chosen during the downward search.
    pub ignored_markers: Vec<PathBuf>,
    pub workspaces: Vec<Workspace>,
    /// Rows the workspace selector would offer, fallback entry included.
    pub entries: Vec<SelectorEntry>,
    pub resolved: Option<ResolvedWorkspace>,
    pub p4_available: bool,
}

/// What a completed installation wrote.
#[derive(Debug)]
pub struct InstallResult {
    pub python_dir: PathBuf,
    pub scripts: Vec<PathBuf>,
    pub config_path: PathBuf,
    pub outcome: PatchOutcome,
    pub backup: Option<PathBuf>,
}
