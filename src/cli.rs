use crate::command;
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "p4menu")]
#[command(about = "Installs the 'Show in P4' context menu into an Unreal Engine project")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the project, pick a workspace, and install the context menu
    Install {
        /// Unreal project root (skips auto-detection; must contain a .uproject file)
        #[arg(long)]
        project: Option<PathBuf>,

        /// P4 workspace root (skips workspace selection)
        #[arg(long)]
        workspace: Option<PathBuf>,

        /// Run non-interactively, accepting the auto-detected values
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show what auto-detection finds, without installing anything
    Detect {
        /// Unreal project root (skips auto-detection; must contain a .uproject file)
        #[arg(long)]
        project: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List Perforce workspaces for the current user
    #[command(visible_alias = "ls")]
    Workspaces {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// --- Public Entry Point ---
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Install {
            project,
            workspace,
            yes,
        } => command::install::run(project, workspace, yes),
        Commands::Detect { project, json } => command::detect::run(project, json),
        Commands::Workspaces { json } => command::workspaces::run(json),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}
