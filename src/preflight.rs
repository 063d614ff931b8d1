//! Preflight checks for the host toolchain.
//!
//! Validates that required external tools exist before any stage runs, so a
//! missing git or CMake fails with an install hint instead of a cryptic
//! mid-pipeline error. MSBuild is deliberately not checked here; it is
//! rarely on PATH and has its own locator in the compile stage.

use anyhow::{bail, Result};

/// Check if a command exists on the host search path.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Tools every build run needs, as (command, package) pairs.
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[("git", "git"), ("cmake", "cmake")];

/// Check that specific tools are available.
///
/// Returns an error listing every missing tool and the package providing it.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let mut missing = Vec::new();

    for (tool, package) in tools {
        if !command_exists(tool) {
            missing.push((*tool, *package));
        }
    }

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check all tools in [`REQUIRED_TOOLS`].
pub fn check_host_tools() -> Result<()> {
    check_required_tools(REQUIRED_TOOLS)
}
