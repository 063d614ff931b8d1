//! Error taxonomy for the build pipeline.
//!
//! Each stage has its own error type so the orchestrator can apply the
//! right fatality policy: fetch, configure, tool-location, and header-patch
//! failures halt the pipeline; compile failures and missing rename artifacts
//! are reported and the pipeline continues.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal failure while materializing a pinned dependency checkout.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cloning {name} from {url} failed with exit code {code}")]
    CloneFailed {
        name: String,
        url: String,
        code: i32,
    },

    #[error("resetting {name} to pinned commit {commit} failed with exit code {code}")]
    ResetFailed {
        name: String,
        commit: String,
        code: i32,
    },

    #[error("could not read the checked-out revision of {name} at {}", path.display())]
    RevParseFailed { name: String, path: PathBuf },

    #[error("fetching {name} failed")]
    Process {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Fatal failure of the external build-file generator.
#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("cmake exited with code {code}; make sure CMake is installed and up to date")]
    NonZeroExit { code: i32 },

    #[error("failed to run cmake")]
    Launch(#[source] anyhow::Error),
}

/// Fatal failure inside the compile stage.
///
/// A non-zero compiler exit is deliberately *not* represented here; it is a
/// [`CompileOutcome`](crate::toolchain::CompileOutcome) the orchestrator logs
/// and moves past. Only failures that make compilation impossible belong in
/// this type.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("could not find MSBuild; make sure Visual Studio is installed")]
    ToolNotFound,

    #[error("failed to run the build executable")]
    Launch(#[source] anyhow::Error),
}

/// Fatal failure while patching generated headers or renaming libraries.
///
/// A module directory with no matching library artifact is not an error at
/// all; it is a recorded warning on the rename report.
#[derive(Debug, Error)]
pub enum RemediationError {
    #[error("reading {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("marker '{marker}' not found in {}", path.display())]
    MarkerNotFound { marker: String, path: PathBuf },

    #[error("renaming {} to {}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scanning {}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rejected build parameter from the invoking pipeline.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("compile target '{value}' not recognized, options are: module / extension")]
    UnknownCompileTarget { value: String },
}
