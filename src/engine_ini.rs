use anyhow::{Context, Result};
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::scripts;

/// Section header the startup directive lives under.
pub const PYTHON_SECTION: &str = "[Python]";
/// Directive that registers the startup hook with the engine.
pub const STARTUP_DIRECTIVE: &str = "+StartupScripts=init_unreal.py";

const BACKUP_SUFFIX: &str = ".backup";

/// What the patch did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOutcome {
    /// The startup script was already referenced; nothing was written.
    AlreadyConfigured,
    /// The directive was inserted right after an existing `[Python]` header.
    InsertedIntoSection,
    /// No `[Python]` section existed; header and directive were appended.
    AppendedSection,
    /// The config file did not exist and was created from scratch.
    CreatedFile,
}

/// Result of applying the patch to a file on disk.
#[derive(Debug)]
pub struct AppliedPatch {
    pub outcome: PatchOutcome,
    /// Backup written before an in-place modification, if one was made.
    pub backup: Option<PathBuf>,
}

/// Patch the config document text.
///
/// Returns the document borrowed and unchanged when the startup script is
/// already referenced, which makes a re-run byte-identical. Otherwise the
/// directive becomes the line immediately after the `[Python]` header, or a
/// whole new section is appended when the document has none. Headers are
/// matched as full lines so values or comments mentioning `[Python]` are
/// never touched.
pub fn patch_document(content: &str) -> (Cow<'_, str>, PatchOutcome) {
    if content.contains(scripts::INIT_SCRIPT_NAME) {
        return (Cow::Borrowed(content), PatchOutcome::AlreadyConfigured);
    }

    let has_header = content.lines().any(|line| line.trim() == PYTHON_SECTION);
    if !has_header {
        let mut out = String::with_capacity(content.len() + 64);
        out.push_str(content);
        out.push('\n');
        out.push_str(PYTHON_SECTION);
        out.push('\n');
        out.push_str(STARTUP_DIRECTIVE);
        out.push('\n');
        return (Cow::Owned(out), PatchOutcome::AppendedSection);
    }

    let mut out = String::with_capacity(content.len() + STARTUP_DIRECTIVE.len() + 2);
    let mut inserted = false;
    for line in content.split_inclusive('\n') {
        out.push_str(line);
        if !inserted && line.trim() == PYTHON_SECTION {
            // The header may be the last line and lack a terminator.
            if !line.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(STARTUP_DIRECTIVE);
            out.push('\n');
            inserted = true;
        }
    }
    (Cow::Owned(out), PatchOutcome::InsertedIntoSection)
}

/// Apply the startup-script patch to the config file at `path`.
///
/// A missing file is created (with parents) holding the minimal section. An
/// in-place change copies the original to `<name>.backup` first, so the
/// backup always lands on disk before the original is touched. A no-op
/// re-patch writes nothing, backup included.
pub fn apply(path: &Path) -> Result<AppliedPatch> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = format!("{}\n{}\n", PYTHON_SECTION, STARTUP_DIRECTIVE);
        fs::write(path, content)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        info!(path = %path.display(), "config:created new engine config");
        return Ok(AppliedPatch {
            outcome: PatchOutcome::CreatedFile,
            backup: None,
        });
    }

    let original = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let (patched, outcome) = patch_document(&original);

    if outcome == PatchOutcome::AlreadyConfigured {
        info!(path = %path.display(), "config:startup script already configured");
        return Ok(AppliedPatch {
            outcome,
            backup: None,
        });
    }

    let backup = backup_path(path);
    fs::copy(path, &backup).with_context(|| {
        format!(
            "Failed to back up {} to {}",
            path.display(),
            backup.display()
        )
    })?;
    debug!(backup = %backup.display(), "config:backup written");

    fs::write(path, patched.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), outcome = ?outcome, "config:patched");

    Ok(AppliedPatch {
        outcome,
        backup: Some(backup),
    })
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(BACKUP_SUFFIX);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_patch_inserts_directly_after_header() {
        let doc = "[Core]\nA=1\n\n[Python]\nOther=2\n";
        let (patched, outcome) = patch_document(doc);
        assert_eq!(outcome, PatchOutcome::InsertedIntoSection);
        assert_eq!(
            patched.as_ref(),
            "[Core]\nA=1\n\n[Python]\n+StartupScripts=init_unreal.py\nOther=2\n"
        );
    }

    #[test]
    fn test_patch_appends_section_when_missing() {
        let doc = "[Core]\nA=1\n";
        let (patched, outcome) = patch_document(doc);
        assert_eq!(outcome, PatchOutcome::AppendedSection);
        assert_eq!(
            patched.as_ref(),
            "[Core]\nA=1\n\n[Python]\n+StartupScripts=init_unreal.py\n"
        );
    }

    #[test]
    fn test_patch_is_idempotent() {
        let doc = "[Python]\nOther=2\n";
        let (first, _) = patch_document(doc);
        let first = first.into_owned();
        let (second, outcome) = patch_document(&first);
        assert_eq!(outcome, PatchOutcome::AlreadyConfigured);
        assert_eq!(second.as_ref(), first.as_str());
        assert!(matches!(patch_document(&first).0, Cow::Borrowed(_)));
    }

    #[test]
    fn test_patch_handles_crlf_documents() {
        let doc = "[Python]\r\nOther=2\r\n";
        let (patched, outcome) = patch_document(doc);
        assert_eq!(outcome, PatchOutcome::InsertedIntoSection);
        assert_eq!(
            patched.as_ref(),
            "[Python]\r\n+StartupScripts=init_unreal.py\nOther=2\r\n"
        );
    }

    #[test]
    fn test_patch_handles_header_without_trailing_newline() {
        let doc = "[Core]\nA=1\n[Python]";
        let (patched, outcome) = patch_document(doc);
        assert_eq!(outcome, PatchOutcome::InsertedIntoSection);
        assert_eq!(
            patched.as_ref(),
            "[Core]\nA=1\n[Python]\n+StartupScripts=init_unreal.py\n"
        );
    }

    #[test]
    fn test_patch_ignores_lookalike_section_names() {
        let doc = "[PythonScriptPlugin]\nA=1\n";
        let (patched, outcome) = patch_document(doc);
        assert_eq!(outcome, PatchOutcome::AppendedSection);
        assert!(patched.contains("[PythonScriptPlugin]\nA=1\n"));
        assert!(patched.ends_with("[Python]\n+StartupScripts=init_unreal.py\n"));
    }

    #[test]
    fn test_apply_creates_missing_file_without_backup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Config/DefaultEngine.ini");

        let applied = apply(&path).unwrap();
        assert_eq!(applied.outcome, PatchOutcome::CreatedFile);
        assert_eq!(applied.backup, None);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[Python]\n+StartupScripts=init_unreal.py\n"
        );
        assert!(!tmp.path().join("Config/DefaultEngine.ini.backup").exists());
    }

    #[test]
    fn test_apply_backs_up_before_modifying() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("DefaultEngine.ini");
        let original = "[Core]\nA=1\n";
        fs::write(&path, original).unwrap();

        let applied = apply(&path).unwrap();
        assert_eq!(applied.outcome, PatchOutcome::AppendedSection);

        let backup = applied.backup.unwrap();
        assert_eq!(backup, tmp.path().join("DefaultEngine.ini.backup"));
        // The backup holds the pre-patch content.
        assert_eq!(fs::read_to_string(&backup).unwrap(), original);
        assert!(
            fs::read_to_string(&path)
                .unwrap()
                .contains(STARTUP_DIRECTIVE)
        );
    }

    #[test]
    fn test_apply_twice_is_a_no_op_without_backup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("DefaultEngine.ini");
        fs::write(&path, "[Python]\n").unwrap();

        let first = apply(&path).unwrap();
        assert_eq!(first.outcome, PatchOutcome::InsertedIntoSection);
        let after_first = fs::read_to_string(&path).unwrap();

        // Remove the backup so a second one would be detectable.
        fs::remove_file(first.backup.unwrap()).unwrap();

        let second = apply(&path).unwrap();
        assert_eq!(second.outcome, PatchOutcome::AlreadyConfigured);
        assert_eq!(second.backup, None);
        assert_eq!(fs::read_to_string(&path).unwrap(), after_first);
        assert!(!tmp.path().join("DefaultEngine.ini.backup").exists());
    }
}
