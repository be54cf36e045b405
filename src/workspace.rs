use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::p4::{self, Workspace};
use crate::paths;

/// Environment variable that overrides the config-marker filename used by
/// the resolver's fallback search.
pub const P4CONFIG_ENV: &str = "P4CONFIG";
const P4CONFIG_DEFAULT: &str = ".p4config";

/// How a workspace root was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// `p4 info` reported a client root for the project directory.
    ClientRoot,
    /// A config-marker file was found in the project's ancestor chain.
    ConfigMarker,
    /// Fell back to the project root itself.
    ProjectRoot,
}

/// The resolver's best guess at the workspace root.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedWorkspace {
    pub root: PathBuf,
    pub source: Resolution,
    /// Name of the enumerated workspace whose root matches, if any. `None`
    /// means the root is free-form manual text as far as p4 is concerned.
    pub matched: Option<String>,
}

/// One row of the workspace selector.
#[derive(Debug, Clone, Serialize)]
pub struct SelectorEntry {
    pub label: String,
    pub root: PathBuf,
}

/// Enumerate Perforce workspaces, filtered to the current user when the
/// user can be determined.
///
/// Best effort by contract: any p4 failure yields an empty list, never an
/// error.
pub fn enumerate() -> Vec<Workspace> {
    let user = p4::current_user();
    debug!(user = ?user, "workspace:enumerating");

    let workspaces = p4::list_workspaces(user.as_deref());
    if workspaces.is_empty() {
        warn!("workspace:no workspaces reported by p4");
    } else {
        info!(count = workspaces.len(), "workspace:enumerated");
    }
    workspaces
}

/// Build the selector rows offered to the user. When enumeration came back
/// empty, offer a single manual entry against the known project root.
pub fn selector_entries(
    workspaces: &[Workspace],
    project_root: Option<&Path>,
) -> Vec<SelectorEntry> {
    if workspaces.is_empty() {
        return match project_root {
            Some(root) => vec![SelectorEntry {
                label: format!("Manual: {}", root.display()),
                root: root.to_path_buf(),
            }],
            None => Vec::new(),
        };
    }

    workspaces
        .iter()
        .map(|ws| SelectorEntry {
            label: format!("{} ({})", ws.name, ws.root.display()),
            root: ws.root.clone(),
        })
        .collect()
}

/// Resolve the most likely workspace root for a project.
///
/// Priority: the client root reported by `p4 info`, then a config-marker
/// file in the project's ancestor chain, then the project root itself.
/// With no project root there is nothing to go on and resolution fails.
pub fn resolve(project_root: Option<&Path>, known: &[Workspace]) -> Option<ResolvedWorkspace> {
    let project_root = project_root?;
    Some(resolve_from(
        p4::client_root(project_root),
        project_root,
        known,
        &config_marker_name(),
    ))
}

/// Resolution chain below the p4 invocation, split out so the priority
/// order is testable with a fabricated client root.
fn resolve_from(
    client_root: Option<PathBuf>,
    project_root: &Path,
    known: &[Workspace],
    marker_name: &str,
) -> ResolvedWorkspace {
    let (root, source) = if let Some(root) = client_root {
        info!(root = %root.display(), "workspace:resolved from p4 client root");
        (root, Resolution::ClientRoot)
    } else if let Some(root) = find_config_marker(project_root, marker_name) {
        info!(root = %root.display(), marker = marker_name, "workspace:resolved from config marker");
        (root, Resolution::ConfigMarker)
    } else {
        info!(root = %project_root.display(), "workspace:falling back to project root");
        (project_root.to_path_buf(), Resolution::ProjectRoot)
    };

    let root = paths::normalize(&root);
    let matched = known
        .iter()
        .find(|ws| paths::normalize(&ws.root) == root)
        .map(|ws| ws.name.clone());

    ResolvedWorkspace {
        root,
        source,
        matched,
    }
}

/// Name of the config-marker file, honoring the environment override.
fn config_marker_name() -> String {
    std::env::var(P4CONFIG_ENV)
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| P4CONFIG_DEFAULT.to_string())
}

/// Search `start` and its ancestors, nearest first, for the config-marker
/// file; the first directory containing it is the workspace root.
fn find_config_marker(start: &Path, marker_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker_name).is_file())
        .map(Path::to_path_buf)
}
