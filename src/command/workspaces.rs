use anyhow::Result;
use pathdiff::diff_paths;
use tabled::{
    Table, Tabled,
    settings::{Padding, Style, object::Columns},
};

use crate::workspace;

#[derive(Tabled)]
struct WorkspaceRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ROOT")]
    root: String,
}

pub fn run(json: bool) -> Result<()> {
    let workspaces = workspace::enumerate();

    if json {
        println!("{}", serde_json::to_string_pretty(&workspaces)?);
        return Ok(());
    }

    if workspaces.is_empty() {
        println!("No P4 workspaces found");
        return Ok(());
    }

    let current_dir = std::env::current_dir()?;

    let rows: Vec<WorkspaceRow> = workspaces
        .into_iter()
        .map(|ws| {
            let root = diff_paths(&ws.root, &current_dir)
                .map(|p| {
                    let s = p.display().to_string();
                    if s.is_empty() || s == "." {
                        "(here)".to_string()
                    } else {
                        s
                    }
                })
                .unwrap_or_else(|| ws.root.display().to_string());

            WorkspaceRow {
                name: ws.name,
                root,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::blank())
        .modify(Columns::new(0..1), Padding::new(0, 1, 0, 0));

    println!("{table}");

    Ok(())
}
