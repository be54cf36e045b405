use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extension that marks an Unreal project root.
pub const PROJECT_MARKER_EXT: &str = "uproject";

/// How many directory levels the workspace-to-project search descends.
const MAX_SEARCH_DEPTH: usize = 3;

/// Result of the bounded downward search inside a workspace.
#[derive(Debug)]
pub struct ProjectSearch {
    /// Directory containing the chosen marker file.
    pub root: PathBuf,
    /// Marker files found at the same depth but not chosen.
    pub ignored: Vec<PathBuf>,
}

/// Check whether `dir` directly contains a project marker file.
pub fn has_project_marker(dir: &Path) -> bool {
    first_marker_in(dir).is_some()
}

/// Walk from `start` up through its ancestors and return the first
/// directory containing a project marker file, nearest first.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        if has_project_marker(dir) {
            debug!(path = %dir.display(), "project:found via ancestor search");
            return Some(dir.to_path_buf());
        }
    }
    None
}

/// Search a workspace for a project, one depth level at a time, stopping at
/// the first level that contains any marker file. Never descends past
/// `MAX_SEARCH_DEPTH` levels.
///
/// Ties at the matching level go to the first path in sorted order; the
/// rest are reported in `ignored`.
pub fn find_project_in_workspace(workspace: &Path) -> Option<ProjectSearch> {
    if !workspace.is_dir() {
        warn!(path = %workspace.display(), "project:workspace path does not exist");
        return None;
    }

    for depth in 0..MAX_SEARCH_DEPTH {
        let mut found = markers_at_depth(workspace, depth);
        if found.is_empty() {
            continue;
        }
        found.sort();

        let marker = found.remove(0);
        let root = marker.parent()?.to_path_buf();
        if !found.is_empty() {
            debug!(
                count = found.len() + 1,
                chosen = %marker.display(),
                "project:multiple projects at this depth"
            );
        }
        return Some(ProjectSearch {
            root,
            ignored: found,
        });
    }

    None
}

/// Marker files exactly `depth` levels below `workspace`.
fn markers_at_depth(workspace: &Path, depth: usize) -> Vec<PathBuf> {
    let mut pattern = glob::Pattern::escape(&workspace.to_string_lossy());
    for _ in 0..depth {
        pattern.push_str("/*");
    }
    pattern.push_str("/*.");
    pattern.push_str(PROJECT_MARKER_EXT);

    match glob::glob(&pattern) {
        // Unreadable entries are skipped: detection degrades, never fails.
        Ok(paths) => paths.flatten().collect(),
        Err(e) => {
            debug!(pattern = %pattern, error = %e, "project:bad glob pattern");
            Vec::new()
        }
    }
}

/// Find the first `.uproject` file directly inside `dir`, in sorted order.
///
/// Read errors are treated as "nothing here" so an unreadable directory in
/// the ancestor chain cannot abort detection.
fn first_marker_in(dir: &Path) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = %dir.display(), error = %e, "project:directory not readable");
            return None;
        }
    };

    let mut markers: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().and_then(|ext| ext.to_str()) == Some(PROJECT_MARKER_EXT)
        })
        .collect();
    markers.sort();
    markers.into_iter().next()
}
