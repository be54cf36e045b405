use std::path::{Path, PathBuf};
use tracing::debug;

use crate::p4::Workspace;
use crate::workspace::{self, ResolvedWorkspace, SelectorEntry};
use crate::{paths, project};

use super::types::ValidationError;

/// State for one installer session.
///
/// Holds what detection found; operations take it by reference and return
/// results instead of mutating shared fields, so the pure logic stays
/// testable apart from the interactive shell.
#[derive(Debug)]
pub struct SessionContext {
    pub project_root: Option<PathBuf>,
    /// Snapshot of what p4 reported, rebuilt in full on every refresh.
    pub workspaces: Vec<Workspace>,
    pub resolved: Option<ResolvedWorkspace>,
}

impl SessionContext {
    /// Point the session at a different project root.
    ///
    /// Rejects directories without a project marker, then re-resolves the
    /// workspace guess against the already-enumerated set.
    pub fn set_project_root(&mut self, dir: &Path) -> Result<(), ValidationError> {
        if !project::has_project_marker(dir) {
            return Err(ValidationError::NotAProject(dir.to_path_buf()));
        }
        self.project_root = Some(paths::normalize(dir));
        self.resolved = workspace::resolve(self.project_root.as_deref(), &self.workspaces);
        debug!(project = ?self.project_root, "session:project root set");
        Ok(())
    }

    /// Rows the workspace selector should offer.
    pub fn entries(&self) -> Vec<SelectorEntry> {
        workspace::selector_entries(&self.workspaces, self.project_root.as_deref())
    }

    /// The resolved workspace root as editable text, if resolution worked.
    pub fn default_workspace_text(&self) -> Option<String> {
        self.resolved
            .as_ref()
            .map(|resolved| resolved.root.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn empty_session() -> SessionContext {
        SessionContext {
            project_root: None,
            workspaces: Vec::new(),
            resolved: None,
        }
    }

    #[test]
    fn test_set_project_root_rejects_unmarked_directory() {
        let tmp = TempDir::new().unwrap();
        let mut session = empty_session();

        let err = session.set_project_root(tmp.path()).unwrap_err();
        assert!(matches!(err, ValidationError::NotAProject(_)));
        assert_eq!(session.project_root, None);
    }

    #[test]
    fn test_set_project_root_re_resolves() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Game.uproject"), "").unwrap();
        let mut session = empty_session();

        session.set_project_root(tmp.path()).unwrap();
        assert_eq!(session.project_root, Some(tmp.path().to_path_buf()));
        // With no p4 data and no config marker the guess is the project root.
        assert!(session.resolved.is_some());
    }

    #[test]
    fn test_default_workspace_text_requires_resolution() {
        assert_eq!(empty_session().default_workspace_text(), None);
    }
}
