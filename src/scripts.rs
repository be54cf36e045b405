use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// In-engine script that registers the context menu entry.
pub const MENU_SCRIPT_NAME: &str = "p4_context_menu.py";
/// Startup hook executed by the engine's Python plugin on editor start.
pub const INIT_SCRIPT_NAME: &str = "init_unreal.py";

const MENU_SCRIPT: &str = r#"import unreal
import subprocess
import os

class P4ContextMenu:
    """
    Adds a 'Show in P4' context menu option to the Content Browser
    that opens P4V and selects the file in Perforce.
    """

    @staticmethod
    def show_in_p4(asset_paths):
        """
        Opens P4V and navigates to the selected asset(s).

        Args:
            asset_paths: List of asset paths in Unreal format (/Game/...)
        """
        for asset_path in asset_paths:
            # Convert Unreal asset path to file system path
            file_path = P4ContextMenu.get_file_path_from_asset(asset_path)

            if file_path and os.path.exists(file_path):
                try:
                    # Use p4vc with CMD to ensure proper execution
                    # Set working directory to project root to inherit P4 connection settings
                    project_dir = unreal.Paths.project_dir()
                    cmd = f'p4vc workspacewindow -s "{file_path}"'
                    subprocess.Popen(cmd, shell=True, cwd=project_dir)
                    unreal.log(f"Opening P4V for: {file_path}")
                except Exception as e:
                    unreal.log_error(f"Failed to open P4V: {str(e)}")
                    unreal.log_error(f"Command was: p4vc workspacewindow -s \"{file_path}\"")
            else:
                unreal.log_error(f"File not found: {file_path}")

    @staticmethod
    def get_file_path_from_asset(asset_path):
        """
        Converts an Unreal asset path to a file system path.

        Args:
            asset_path: Unreal asset path (e.g., /Game/MyFolder/MyAsset)

        Returns:
            Full file system path to the .uasset file
        """
        # Remove any sub-object references (e.g., /Game/Asset.Asset:SubObject)
        package_name = asset_path.split('.')[0]

        # Convert /Game/ path to Content/ path
        if package_name.startswith('/Game/'):
            relative_path = package_name.replace('/Game/', '', 1)

            # Get the full project content directory and normalize it
            content_dir = unreal.Paths.project_content_dir()
            content_dir = os.path.abspath(content_dir)

            # Build the full file path
            file_path = os.path.join(content_dir, relative_path + '.uasset')

            # Normalize the path to resolve any .. or . components
            file_path = os.path.abspath(file_path)

            unreal.log(f"Converted {asset_path} to {file_path}")
            return file_path
        else:
            # Handle engine content or plugin content
            unreal.log_warning(f"Non-game content path: {package_name}")
            return None

    @staticmethod
    def register_menu():
        """
        Registers the context menu extension with Unreal's Content Browser.
        """
        # Create a new menu entry
        menus = unreal.ToolMenus.get()

        # Find the Content Browser asset context menu
        # The menu name for right-click on assets is "ContentBrowser.AssetContextMenu"
        menu_name = "ContentBrowser.AssetContextMenu"
        menu = menus.find_menu(menu_name)

        if not menu:
            unreal.log_error(f"Could not find menu: {menu_name}")
            return

        # Add a new section for source control operations
        entry = unreal.ToolMenuEntry(
            name="ShowInP4",
            type=unreal.MultiBlockType.MENU_ENTRY,
        )
        entry.set_label(unreal.Text("Show in P4"))
        entry.set_tool_tip(unreal.Text("Open Perforce and select this file"))

        # Set the menu entry to call our function
        entry.set_string_command(
            type=unreal.ToolMenuStringCommandType.PYTHON,
            custom_type="",
            string="import p4_context_menu; p4_context_menu.on_show_in_p4_clicked()"
        )

        # Add to the source control section (or create new section)
        menu.add_menu_entry("SourceControl", entry)

        menus.refresh_all_widgets()
        unreal.log("P4 Context Menu registered successfully!")


def on_show_in_p4_clicked():
    """
    Called when the 'Show in P4' menu item is clicked.
    Gets the selected assets and opens them in P4V.
    """
    # Get the currently selected assets in Content Browser
    utility = unreal.EditorUtilityLibrary()
    selected_assets = utility.get_selected_assets()

    if not selected_assets:
        unreal.log_warning("No assets selected")
        return

    # Get asset paths
    asset_paths = [asset.get_path_name() for asset in selected_assets]

    # Show in P4
    P4ContextMenu.show_in_p4(asset_paths)


# Register the menu when this script is executed
if __name__ == '__main__':
    P4ContextMenu.register_menu()
"#;

const INIT_SCRIPT: &str = r#""""
Startup script for Unreal Engine Python
This file is automatically executed when the editor starts.
"""

import unreal

# Register the P4 context menu
try:
    import p4_context_menu
    p4_context_menu.P4ContextMenu.register_menu()
    unreal.log("P4 Context Menu initialized on startup")
except Exception as e:
    unreal.log_error(f"Failed to initialize P4 Context Menu: {str(e)}")
"#;

/// Write both generated scripts into the scripting directory, overwriting
/// existing files of the same name.
pub fn write_scripts(python_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(2);
    for (name, content) in [(MENU_SCRIPT_NAME, MENU_SCRIPT), (INIT_SCRIPT_NAME, INIT_SCRIPT)] {
        let path = python_dir.join(name);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "install:script written");
        written.push(path);
    }
    Ok(written)
}
