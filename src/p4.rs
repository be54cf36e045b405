use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cmd::Cmd;
use crate::paths;

/// Hard ceiling on every Perforce invocation. A hung server or a login
/// prompt must not wedge the tool for longer than this.
pub const P4_TIMEOUT: Duration = Duration::from_secs(10);

/// A Perforce client workspace as reported by `p4 clients`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workspace {
    pub name: String,
    pub root: PathBuf,
}

/// Check whether the p4 binary is on PATH.
pub fn is_available() -> bool {
    which::which("p4").is_ok()
}

/// Get the current Perforce user name via `p4 info`.
///
/// Best effort: any failure is logged and reported as `None` so enumeration
/// can continue unfiltered.
pub fn current_user() -> Option<String> {
    let output = match Cmd::new("p4")
        .arg("info")
        .timeout(P4_TIMEOUT)
        .run_and_capture_stdout()
    {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "p4:info failed while looking up user");
            return None;
        }
    };
    parse_user_name(&output)
}

/// List client workspaces, optionally restricted to a user.
///
/// Returns an empty list when p4 is missing, times out, exits non-zero, or
/// produces no parseable rows. Enumeration is best effort by contract; the
/// caller decides what to offer instead.
pub fn list_workspaces(user: Option<&str>) -> Vec<Workspace> {
    let mut cmd = Cmd::new("p4").arg("clients").timeout(P4_TIMEOUT);
    if let Some(user) = user {
        cmd = cmd.args(&["-u", user]);
    }

    match cmd.run_and_capture_stdout() {
        Ok(output) => {
            let workspaces = parse_clients(&output);
            debug!(count = workspaces.len(), "p4:clients parsed");
            workspaces
        }
        Err(e) => {
            warn!(error = %e, "p4:clients failed");
            Vec::new()
        }
    }
}

/// Ask `p4 info`, run from `dir`, for the root of the client workspace that
/// maps that directory. `None` when p4 is unavailable or reports no usable
/// root.
pub fn client_root(dir: &Path) -> Option<PathBuf> {
    let output = match Cmd::new("p4")
        .arg("info")
        .workdir(dir)
        .timeout(P4_TIMEOUT)
        .run_and_capture_stdout()
    {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "p4:info failed while detecting client root");
            return None;
        }
    };
    parse_client_root(&output)
}

/// Extract the user name from `p4 info` output.
fn parse_user_name(output: &str) -> Option<String> {
    for line in output.lines() {
        if !line.to_ascii_lowercase().starts_with("user name:") {
            continue;
        }
        let (_, value) = line.split_once(':')?;
        let user = value.trim();
        if !user.is_empty() {
            return Some(user.to_string());
        }
    }
    None
}

/// Parse `p4 clients` output into workspaces, preserving output order.
///
/// Each row looks like:
///
/// `Client <name> <date> root <path> 'description'`
///
/// The column layout is not a stable contract across server versions, so
/// this is a token scan: the name is the token after `Client`, the root is
/// the token after the literal `root` marker. Rows that do not yield both
/// are skipped.
fn parse_clients(output: &str) -> Vec<Workspace> {
    let mut workspaces = Vec::new();
    for line in output.lines() {
        if !line.starts_with("Client ") {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(name) = tokens.get(1) else {
            continue;
        };
        let root = tokens
            .iter()
            .position(|token| *token == "root")
            .and_then(|idx| tokens.get(idx + 1));
        match root {
            Some(root) => workspaces.push(Workspace {
                name: (*name).to_string(),
                root: paths::normalize(Path::new(root)),
            }),
            None => debug!(line, "p4:clients row skipped, no root marker"),
        }
    }
    workspaces
}

/// Find the `Client root:` line in `p4 info` output.
///
/// Matching is case-insensitive and requires the colon to follow the field
/// name. The value is rejected when empty or `.` (what p4 reports with no
/// client mapping).
fn parse_client_root(output: &str) -> Option<PathBuf> {
    for line in output.lines() {
        let lower = line.to_ascii_lowercase();
        let Some(idx) = lower.find("client root") else {
            continue;
        };
        let after = line[idx + "client root".len()..].trim_start();
        let Some(value) = after.strip_prefix(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() || value == "." {
            continue;
        }
        return Some(paths::normalize(Path::new(value)));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO_OUTPUT: &str = "\
User name: alice
Client name: alice-main
Client host: buildbox
Client root: /home/alice/p4/main
Current directory: /home/alice/p4/main/Game
Server address: ssl:perforce:1666
";

    const CLIENTS_OUTPUT: &str = "\
Client alice-main 2024/01/02 root /home/alice/p4/main 'Created by alice. '
Client alice-art 2024/03/15 root /home/alice/p4//art 'Art workspace '
";

    #[test]
    fn test_parse_user_name() {
        assert_eq!(parse_user_name(INFO_OUTPUT), Some("alice".to_string()));
    }

    #[test]
    fn test_parse_user_name_case_insensitive() {
        assert_eq!(
            parse_user_name("user Name: bob\n"),
            Some("bob".to_string())
        );
    }

    #[test]
    fn test_parse_user_name_missing() {
        assert_eq!(parse_user_name("Server address: perforce:1666\n"), None);
        assert_eq!(parse_user_name(""), None);
    }

    #[test]
    fn test_parse_clients() {
        let workspaces = parse_clients(CLIENTS_OUTPUT);
        assert_eq!(workspaces.len(), 2);
        assert_eq!(workspaces[0].name, "alice-main");
        assert_eq!(workspaces[0].root, PathBuf::from("/home/alice/p4/main"));
        // Redundant separators are normalized before storing.
        assert_eq!(workspaces[1].name, "alice-art");
        assert_eq!(workspaces[1].root, PathBuf::from("/home/alice/p4/art"));
    }

    #[test]
    fn test_parse_clients_preserves_output_order() {
        let workspaces = parse_clients(CLIENTS_OUTPUT);
        let names: Vec<&str> = workspaces.iter().map(|ws| ws.name.as_str()).collect();
        assert_eq!(names, vec!["alice-main", "alice-art"]);
    }

    #[test]
    fn test_parse_clients_skips_rows_without_root_marker() {
        let output = "Client broken-row 2024/01/02\nClient ok 2024/01/02 root /p4/ok ''\n";
        let workspaces = parse_clients(output);
        assert_eq!(workspaces.len(), 1);
        assert_eq!(workspaces[0].name, "ok");
    }

    #[test]
    fn test_parse_clients_ignores_unrelated_lines() {
        assert!(parse_clients("info: no clients\n").is_empty());
        assert!(parse_clients("").is_empty());
    }

    #[test]
    fn test_parse_client_root() {
        assert_eq!(
            parse_client_root(INFO_OUTPUT),
            Some(PathBuf::from("/home/alice/p4/main"))
        );
    }

    #[test]
    fn test_parse_client_root_case_insensitive() {
        assert_eq!(
            parse_client_root("client ROOT: /depot/ws\n"),
            Some(PathBuf::from("/depot/ws"))
        );
    }

    #[test]
    fn test_parse_client_root_rejects_empty_and_dot() {
        assert_eq!(parse_client_root("Client root: .\n"), None);
        assert_eq!(parse_client_root("Client root:\n"), None);
        assert_eq!(parse_client_root("User name: alice\n"), None);
    }

    #[test]
    fn test_parse_client_root_normalizes() {
        assert_eq!(
            parse_client_root("Client root: /home/alice//p4/./main\n"),
            Some(PathBuf::from("/home/alice/p4/main"))
        );
    }
}
