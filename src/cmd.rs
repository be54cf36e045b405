use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Builder for external command invocations with uniform error reporting
/// and an optional hard timeout.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl Cmd {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            workdir: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|arg| arg.to_string()));
        self
    }

    pub fn workdir(mut self, dir: &Path) -> Self {
        self.workdir = Some(dir.to_path_buf());
        self
    }

    /// Kill the process and fail if it has not exited within `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run and require a zero exit status.
    pub fn run(self) -> Result<()> {
        let output = self.output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(anyhow!(
                "'{}' failed: {}",
                self.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }

    /// Run, require a zero exit status, and return trimmed stdout.
    pub fn run_and_capture_stdout(self) -> Result<String> {
        let output = self.output()?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(anyhow!(
                "'{}' failed: {}",
                self.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }

    /// Run and report whether the command exited successfully.
    pub fn run_as_check(self) -> Result<bool> {
        Ok(self.output()?.status.success())
    }

    fn output(&self) -> Result<Output> {
        debug!(program = %self.program, args = ?self.args, "cmd:run");
        match self.timeout {
            None => self
                .command()
                .output()
                .with_context(|| format!("Failed to execute '{}'", self.program)),
            Some(limit) => self.output_with_timeout(limit),
        }
    }

    fn output_with_timeout(&self, limit: Duration) -> Result<Output> {
        let mut child = self
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to execute '{}'", self.program))?;

        let started = Instant::now();
        loop {
            match child
                .try_wait()
                .with_context(|| format!("Failed to poll '{}'", self.program))?
            {
                Some(_) => {
                    return child
                        .wait_with_output()
                        .with_context(|| format!("Failed to collect output of '{}'", self.program));
                }
                None => {
                    if started.elapsed() >= limit {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(anyhow!(
                            "'{}' did not finish within {}s",
                            self.display(),
                            limit.as_secs()
                        ));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            }
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }
        command
    }

    fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}
