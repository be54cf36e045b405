use anyhow::{Context, Result};
use std::fs;
use tracing::{debug, info};

use crate::{engine_ini, scripts};

use super::context::SessionContext;
use super::types::{InstallResult, ValidationError};

/// Install the context menu into the project: the scripting directory, the
/// two generated scripts, and the engine config patch, strictly in that
/// order.
///
/// Validation happens before any side effect. After that, the first failing
/// step aborts the rest; steps already completed are left in place.
pub fn install(context: &SessionContext, workspace: &str) -> Result<InstallResult> {
    let workspace = workspace.trim();
    if workspace.is_empty() {
        return Err(ValidationError::EmptyWorkspace.into());
    }
    let project_root = context
        .project_root
        .as_deref()
        .ok_or(ValidationError::MissingProjectRoot)?;

    info!(project = %project_root.display(), workspace, "install:start");

    // 1. Scripting directory.
    let python_dir = project_root.join("Content").join("Python");
    fs::create_dir_all(&python_dir)
        .with_context(|| format!("Failed to create {}", python_dir.display()))?;
    debug!(path = %python_dir.display(), "install:scripting directory ready");

    // 2. Generated scripts, overwritten unconditionally.
    let written = scripts::write_scripts(&python_dir)?;

    // 3. Engine config patch.
    let config_path = project_root.join("Config").join("DefaultEngine.ini");
    let patch = engine_ini::apply(&config_path)?;

    info!(
        project = %project_root.display(),
        outcome = ?patch.outcome,
        "install:completed"
    );

    Ok(InstallResult {
        python_dir,
        scripts: written,
        config_path,
        outcome: patch.outcome,
        backup: patch.backup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_ini::PatchOutcome;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn session(project_root: Option<PathBuf>) -> SessionContext {
        SessionContext {
            project_root,
            workspaces: Vec::new(),
            resolved: None,
        }
    }

    #[test]
    fn test_empty_workspace_is_rejected_with_no_side_effects() {
        let tmp = TempDir::new().unwrap();
        let context = session(Some(tmp.path().to_path_buf()));

        let err = install(&context, "   ").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::EmptyWorkspace)
        ));
        assert!(!tmp.path().join("Content").exists());
        assert!(!tmp.path().join("Config").exists());
    }

    #[test]
    fn test_missing_project_root_is_rejected() {
        let context = session(None);

        let err = install(&context, "/p4/ws").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::MissingProjectRoot)
        ));
    }

    #[test]
    fn test_install_writes_scripts_and_creates_config() {
        let tmp = TempDir::new().unwrap();
        let context = session(Some(tmp.path().to_path_buf()));

        let result = install(&context, "/p4/ws").unwrap();
        assert_eq!(result.python_dir, tmp.path().join("Content/Python"));
        assert!(tmp.path().join("Content/Python/p4_context_menu.py").is_file());
        assert!(tmp.path().join("Content/Python/init_unreal.py").is_file());
        assert_eq!(result.outcome, PatchOutcome::CreatedFile);
        assert_eq!(result.backup, None);
        assert!(tmp.path().join("Config/DefaultEngine.ini").is_file());
    }

    #[test]
    fn test_reinstall_is_idempotent_for_the_config() {
        let tmp = TempDir::new().unwrap();
        let context = session(Some(tmp.path().to_path_buf()));

        install(&context, "/p4/ws").unwrap();
        let second = install(&context, "/p4/ws").unwrap();
        assert_eq!(second.outcome, PatchOutcome::AlreadyConfigured);
        assert_eq!(second.backup, None);
    }

    #[test]
    fn test_install_patches_existing_config_with_backup() {
        let tmp = TempDir::new().unwrap();
        let config_dir = tmp.path().join("Config");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("DefaultEngine.ini"), "[Core]\nA=1\n").unwrap();
        let context = session(Some(tmp.path().to_path_buf()));

        let result = install(&context, "/p4/ws").unwrap();
        assert_eq!(result.outcome, PatchOutcome::AppendedSection);
        assert_eq!(
            result.backup,
            Some(config_dir.join("DefaultEngine.ini.backup"))
        );
    }
}
