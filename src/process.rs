//! Thin builder around `std::process::Command` for external tool invocation.
//!
//! Every external process the orchestrator drives (git, cmake, MSBuild,
//! vcpkg) goes through [`Cmd`] so that failure reporting is uniform:
//! a non-zero exit becomes an error carrying the command line and stderr,
//! unless the caller opted in to inspecting the status itself via
//! [`Cmd::allow_fail`].
//!
//! Execution is synchronous and unbounded: once a child is launched we wait
//! for it to exit, with no timeout and no cancellation.

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Captured result of a finished child process.
#[derive(Debug)]
pub struct CmdOutput {
    /// Raw exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
    success: bool,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.success
    }
}

/// Builder for a single external process invocation.
pub struct Cmd {
    program: String,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
    allow_fail: bool,
    error_msg: Option<String>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
            allow_fail: false,
            error_msg: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_os_string());
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// A non-zero exit is not an error; the caller inspects the status.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Message used instead of the generic one when the command fails.
    pub fn error_msg(mut self, msg: impl Into<String>) -> Self {
        self.error_msg = Some(msg.into());
        self
    }

    /// Run the command, capturing stdout and stderr.
    pub fn run(self) -> Result<CmdOutput> {
        let rendered = self.rendered();
        let mut command = self.command();
        let output = command
            .output()
            .with_context(|| format!("failed to launch '{}'", rendered))?;

        let result = CmdOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        };

        if !result.success && !self.allow_fail {
            let detail = if result.stderr.trim().is_empty() {
                String::new()
            } else {
                format!("\n{}", result.stderr.trim_end())
            };
            match &self.error_msg {
                Some(msg) => bail!("{} (command: {}){}", msg, rendered, detail),
                None => bail!(
                    "command '{}' exited with {}{}",
                    rendered,
                    describe_code(result.code),
                    detail
                ),
            }
        }

        Ok(result)
    }

    /// Run the command with inherited stdio, for long builds whose progress
    /// the user should see. Returns the raw exit code.
    pub fn run_interactive(self) -> Result<Option<i32>> {
        let rendered = self.rendered();
        let mut command = self.command();
        let status = command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("failed to launch '{}'", rendered))?;

        if !status.success() && !self.allow_fail {
            match &self.error_msg {
                Some(msg) => bail!("{} (command: {})", msg, rendered),
                None => bail!(
                    "command '{}' exited with {}",
                    rendered,
                    describe_code(status.code())
                ),
            }
        }

        Ok(status.code())
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        command
    }

    fn rendered(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

/// Fail early with a readable message when a required path is missing.
pub fn ensure_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} not found at: {}", what, path.display());
    }
    Ok(())
}
