use anyhow::Result;
use std::path::PathBuf;

use crate::workflow;
use crate::workspace::Resolution;

/// Print what auto-detection finds, without installing anything.
pub fn run(project: Option<PathBuf>, json: bool) -> Result<()> {
    let start_dir = std::env::current_dir()?;
    let detection = workflow::detect(&start_dir, project.as_deref())?;
    let report = detection.report;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !report.p4_available {
        println!("⚠ p4 command not found on PATH");
    }

    match &report.project_root {
        Some(root) => println!("Unreal project: {}", root.display()),
        None => println!("Unreal project: not detected"),
    }
    for ignored in &report.ignored_markers {
        println!("  ignoring extra project file: {}", ignored.display());
    }

    if report.workspaces.is_empty() {
        println!("P4 workspaces: none found");
    } else {
        println!("P4 workspaces:");
        for ws in &report.workspaces {
            println!("  {} ({})", ws.name, ws.root.display());
        }
    }

    match &report.resolved {
        Some(resolved) => {
            let source = match resolved.source {
                Resolution::ClientRoot => "p4 client root",
                Resolution::ConfigMarker => "config marker",
                Resolution::ProjectRoot => "project root fallback",
            };
            match &resolved.matched {
                Some(name) => println!(
                    "Workspace root: {} [{}] via {}",
                    resolved.root.display(),
                    name,
                    source
                ),
                None => println!("Workspace root: {} via {}", resolved.root.display(), source),
            }
        }
        None => println!("Workspace root: could not resolve (no project root)"),
    }

    Ok(())
}
