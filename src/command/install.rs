use anyhow::Result;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use std::path::PathBuf;

use crate::engine_ini::PatchOutcome;
use crate::paths;
use crate::workflow::{self, SessionContext};

/// Run the full installer flow: detect, confirm or override interactively,
/// then install.
pub fn run(project: Option<PathBuf>, workspace: Option<PathBuf>, yes: bool) -> Result<()> {
    let start_dir = std::env::current_dir()?;
    let detection = workflow::detect(&start_dir, project.as_deref())?;
    let mut context = detection.context;

    match &context.project_root {
        Some(root) => println!("Unreal project: {}", root.display()),
        None => println!("Unreal project: not detected"),
    }

    // Non-interactive runs cannot browse; a still-missing project root is
    // caught by install validation below.
    if context.project_root.is_none() && !yes {
        if !prompt_for_project(&mut context)? {
            println!("Installation cancelled");
            return Ok(());
        }
    }

    let workspace_text = match workspace {
        Some(path) => path.display().to_string(),
        None if yes => context.default_workspace_text().unwrap_or_default(),
        None => prompt_for_workspace(&context)?,
    };

    let project_display = context
        .project_root
        .as_ref()
        .map(|root| root.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string());
    println!("\nInstalling into {}...", project_display);

    let result = workflow::install(&context, &workspace_text)?;

    println!("✓ Scripts installed: {}", result.python_dir.display());
    match result.outcome {
        PatchOutcome::AlreadyConfigured => {
            println!("ℹ {} already configured", result.config_path.display());
        }
        PatchOutcome::CreatedFile => {
            println!("✓ Created {}", result.config_path.display());
        }
        PatchOutcome::InsertedIntoSection | PatchOutcome::AppendedSection => {
            println!("✓ Updated {}", result.config_path.display());
        }
    }
    if let Some(backup) = &result.backup {
        println!("  backup: {}", backup.display());
    }
    println!("\nDone. Restart Unreal Engine to see the 'Show in P4' context menu.");

    Ok(())
}

/// Offer to type a project root when auto-detection came up empty. Returns
/// false when the user declines.
fn prompt_for_project(context: &mut SessionContext) -> Result<bool> {
    let browse = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Could not auto-detect the Unreal project root. Enter it manually?")
        .default(true)
        .interact()?;
    if !browse {
        return Ok(false);
    }

    let typed: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Project root (directory containing the .uproject file)")
        .interact_text()?;
    context.set_project_root(&PathBuf::from(typed.trim()))?;

    if let Some(root) = &context.project_root {
        println!("Unreal project: {}", root.display());
    }
    Ok(true)
}

/// Pick a workspace from the enumerated entries or type one manually. The
/// resolver's guess preselects its entry; an unmatched guess preselects
/// manual entry with the guess as initial text.
fn prompt_for_workspace(context: &SessionContext) -> Result<String> {
    let entries = context.entries();
    let theme = ColorfulTheme::default();

    if entries.is_empty() {
        let typed: String = Input::with_theme(&theme)
            .with_prompt("P4 workspace root")
            .interact_text()?;
        return Ok(typed);
    }

    let resolved_index = context.resolved.as_ref().and_then(|resolved| {
        entries
            .iter()
            .position(|entry| paths::normalize(&entry.root) == resolved.root)
    });

    let mut items: Vec<String> = entries.iter().map(|entry| entry.label.clone()).collect();
    items.push("Enter a path manually".to_string());

    let selection = Select::with_theme(&theme)
        .with_prompt("P4 workspace")
        .items(&items)
        .default(resolved_index.unwrap_or(entries.len()))
        .interact()?;

    if selection == entries.len() {
        let typed: String = Input::with_theme(&theme)
            .with_prompt("P4 workspace root")
            .with_initial_text(context.default_workspace_text().unwrap_or_default())
            .interact_text()?;
        Ok(typed)
    } else {
        Ok(entries[selection].root.display().to_string())
    }
}
