//! Materializing pinned dependency checkouts.
//!
//! A checkout is "fetched" only when its HEAD equals the pinned commit, not
//! merely when the directory exists. A directory left behind by an earlier
//! failed fetch (clone succeeded, reset did not) is therefore repaired on
//! the next run instead of being silently trusted.

use std::path::Path;

use crate::error::FetchError;
use crate::pins::RevisionPin;
use crate::process::Cmd;

/// What `ensure` did to satisfy the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Checkout present and already at the pinned commit; nothing ran.
    AlreadyPinned,
    /// Checkout present at a different commit; hard-reset back to the pin.
    Repinned,
    /// Fresh recursive clone followed by a hard reset to the pin.
    Cloned,
}

/// Makes a pinned working copy exist on disk.
///
/// A seam so orchestrator tests can substitute a recording stub for the
/// real git client.
pub trait Fetcher {
    fn ensure(&self, workspace_root: &Path, pin: &RevisionPin) -> Result<FetchOutcome, FetchError>;
}

/// Production fetcher backed by the `git` client on the host.
pub struct GitFetcher;

impl Fetcher for GitFetcher {
    fn ensure(&self, workspace_root: &Path, pin: &RevisionPin) -> Result<FetchOutcome, FetchError> {
        let checkout = pin.local_path(workspace_root);

        if checkout.exists() {
            let head = head_commit(&checkout, pin)?;
            if head == pin.commit {
                println!(
                    "[cesium] {} already at pinned revision, skipping clone phase",
                    pin.display_name
                );
                return Ok(FetchOutcome::AlreadyPinned);
            }
            println!(
                "[cesium] {} checked out at {} instead of pin {}, resetting",
                pin.display_name, head, pin.commit
            );
            reset_hard(&checkout, pin)?;
            return Ok(FetchOutcome::Repinned);
        }

        println!(
            "[cesium] Cloning {} from {} (branch {})...",
            pin.display_name, pin.url, pin.branch
        );
        // Clone and reset are one unit: a clone that cannot be reset to the
        // pin is a failed fetch, even though the directory now exists.
        clone_recursive(&checkout, pin)?;
        reset_hard(&checkout, pin)?;
        Ok(FetchOutcome::Cloned)
    }
}

fn clone_recursive(dest: &Path, pin: &RevisionPin) -> Result<(), FetchError> {
    let result = Cmd::new("git")
        .args(["clone", "-b", &pin.branch, "--recursive"])
        .arg(&pin.url)
        .arg_path(dest)
        .allow_fail()
        .run()
        .map_err(|source| FetchError::Process {
            name: pin.display_name.clone(),
            source,
        })?;

    if !result.success() {
        return Err(FetchError::CloneFailed {
            name: pin.display_name.clone(),
            url: pin.url.clone(),
            code: result.code.unwrap_or(-1),
        });
    }
    Ok(())
}

fn reset_hard(checkout: &Path, pin: &RevisionPin) -> Result<(), FetchError> {
    let result = Cmd::new("git")
        .args(["reset", "--hard"])
        .arg(&pin.commit)
        .current_dir(checkout)
        .allow_fail()
        .run()
        .map_err(|source| FetchError::Process {
            name: pin.display_name.clone(),
            source,
        })?;

    if !result.success() {
        return Err(FetchError::ResetFailed {
            name: pin.display_name.clone(),
            commit: pin.commit.clone(),
            code: result.code.unwrap_or(-1),
        });
    }
    Ok(())
}

fn head_commit(checkout: &Path, pin: &RevisionPin) -> Result<String, FetchError> {
    let result = Cmd::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(checkout)
        .allow_fail()
        .run()
        .map_err(|source| FetchError::Process {
            name: pin.display_name.clone(),
            source,
        })?;

    if !result.success() {
        return Err(FetchError::RevParseFailed {
            name: pin.display_name.clone(),
            path: checkout.to_path_buf(),
        });
    }
    Ok(result.stdout.trim().to_string())
}
