//! The build pipeline state machine.
//!
//! Stages run strictly in sequence:
//!
//! ```text
//! ResolvingParameters -> Fetching -> Configuring -> Compiling -> Remediating -> Done
//! ```
//!
//! A fatal failure in ResolvingParameters, Fetching, Configuring, or
//! tool location inside Compiling terminates the run as `Failed(stage)`.
//! A compiler that runs and exits non-zero does *not*: remediation still
//! executes, because a partially built tree may already hold generated
//! headers that must be patched before the next attempt. An explicit or
//! confirmed "no" short-circuits straight to Done.
//!
//! There is no retry, no timeout, and no locking; concurrent invocations
//! against the same workspace are unsupported.

use std::fmt;
use std::path::Path;

use anyhow::anyhow;
use thiserror::Error;

use crate::fetch::Fetcher;
use crate::params::{
    BuildContext, BuildDecision, BuildParameters, CompileTarget, Confirm, Precision,
    DOUBLE_PRECISION_DEF,
};
use crate::pins::pinned_dependencies;
use crate::remediate::{
    material_header_path, patch_header, rename_libraries, LibraryNaming, PatchOutcome,
    RenameReport, HEADER_MARKER, OPAQUE_UNDEF,
};
use crate::toolchain::{CompileOutcome, Toolchain};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingParameters,
    Fetching,
    Configuring,
    Compiling,
    Remediating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ResolvingParameters => "ResolvingParameters",
            Stage::Fetching => "Fetching",
            Stage::Configuring => "Configuring",
            Stage::Compiling => "Compiling",
            Stage::Remediating => "Remediating",
            Stage::Done => "Done",
        };
        f.write_str(name)
    }
}

/// Terminal failure of the pipeline, naming the stage that died.
#[derive(Debug, Error)]
#[error("{stage} stage failed")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub source: anyhow::Error,
}

impl StageFailure {
    fn new(stage: Stage, source: impl Into<anyhow::Error>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

/// What a completed run did.
#[derive(Debug)]
pub struct RunSummary {
    /// Stages entered, in order, ending with [`Stage::Done`].
    pub trace: Vec<Stage>,
    /// Whether the compiler ran to a successful exit.
    pub built: bool,
    /// Rename results; `None` when the run decided not to build.
    pub report: Option<RenameReport>,
}

/// Sequences the pipeline over its collaborator seams.
///
/// The fetcher, toolchain, and confirmation capability are injected so the
/// pipeline can be exercised end to end without git, CMake, or a terminal.
pub struct BuildOrchestrator<'a> {
    fetcher: &'a dyn Fetcher,
    toolchain: &'a dyn Toolchain,
    confirm: &'a mut dyn Confirm,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        toolchain: &'a dyn Toolchain,
        confirm: &'a mut dyn Confirm,
    ) -> Self {
        Self {
            fetcher,
            toolchain,
            confirm,
        }
    }

    /// Run the pipeline against a workspace with raw parameter pairs.
    pub fn run(
        &mut self,
        workspace_root: &Path,
        pairs: &[(String, String)],
    ) -> Result<RunSummary, StageFailure> {
        let mut trace = vec![Stage::ResolvingParameters];

        let params =
            BuildParameters::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .map_err(|e| StageFailure::new(Stage::ResolvingParameters, e))?;
        let ctx = BuildContext::resolve(workspace_root, &params);
        match ctx.compile_target {
            CompileTarget::Module => {
                println!("[cesium] Compiling Cesium For Godot as an engine module...")
            }
            CompileTarget::Extension => {
                println!("[cesium] Compiling Cesium For Godot as a GDExtension")
            }
        }
        if ctx.precision == Precision::Double {
            println!(
                "[cesium] Engine uses double-precision reals; consumer build adds {}",
                DOUBLE_PRECISION_DEF
            );
        }

        let proceed = match params.build {
            BuildDecision::Yes => true,
            BuildDecision::No => false,
            BuildDecision::Unset => self.confirm.confirm(
                "Do you want to build Cesium Native (choose yes if it's the first install)? [y/n] ",
            ),
        };
        if !proceed {
            println!("[SKIP] Not building Cesium Native");
            trace.push(Stage::Done);
            return Ok(RunSummary {
                trace,
                built: false,
                report: None,
            });
        }

        trace.push(Stage::Fetching);
        for pin in pinned_dependencies(&ctx) {
            self.fetcher
                .ensure(&ctx.workspace_root, &pin)
                .map_err(|e| StageFailure::new(Stage::Fetching, e))?;
        }

        trace.push(Stage::Configuring);
        self.toolchain
            .configure(&ctx)
            .map_err(|e| StageFailure::new(Stage::Configuring, e))?;

        trace.push(Stage::Compiling);
        let outcome = self
            .toolchain
            .compile(&ctx)
            .map_err(|e| StageFailure::new(Stage::Compiling, e))?;
        match outcome {
            CompileOutcome::Built => {}
            CompileOutcome::ToolchainFailed { code } => {
                // Non-fatal: remediation still runs over the partial tree.
                eprintln!("[WARN] Error building Cesium Native: exit code {}", code);
            }
            CompileOutcome::UnsupportedHost => {}
        }

        trace.push(Stage::Remediating);
        let report = self
            .remediate(&ctx, outcome)
            .map_err(|e| StageFailure::new(Stage::Remediating, e))?;

        trace.push(Stage::Done);
        println!("[cesium] Finished building Cesium Native!");
        Ok(RunSummary {
            trace,
            built: outcome == CompileOutcome::Built,
            report: Some(report),
        })
    }

    fn remediate(
        &self,
        ctx: &BuildContext,
        outcome: CompileOutcome,
    ) -> Result<RenameReport, anyhow::Error> {
        println!("[cesium] Cleaning definitions on generated files...");

        let header = material_header_path(&ctx.native_dir);
        if header.exists() {
            match patch_header(&header, HEADER_MARKER, OPAQUE_UNDEF)? {
                PatchOutcome::Patched => {
                    println!("[cesium] Patched {}", header.display());
                }
                PatchOutcome::AlreadyPatched => {
                    println!("[SKIP] {} already patched", header.display());
                }
            }
        } else if outcome == CompileOutcome::Built {
            // A successful build must have generated it; a missing header
            // here is a real remediation failure.
            return Err(anyhow!(
                "generated header not found after build: {}",
                header.display()
            ));
        } else {
            eprintln!(
                "[WARN] {} not generated yet, skipping header patch",
                header.display()
            );
        }

        Ok(rename_libraries(&ctx.native_dir, &LibraryNaming::default())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompileError, ConfigureError, FetchError};
    use crate::fetch::FetchOutcome;
    use crate::pins::RevisionPin;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use tempfile::TempDir;

    struct StubFetcher {
        seen: RefCell<Vec<String>>,
    }

    impl StubFetcher {
        fn new() -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Fetcher for StubFetcher {
        fn ensure(
            &self,
            _workspace_root: &Path,
            pin: &RevisionPin,
        ) -> Result<FetchOutcome, FetchError> {
            self.seen.borrow_mut().push(pin.display_name.clone());
            Ok(FetchOutcome::Cloned)
        }
    }

    struct StubToolchain {
        configure_fails: bool,
        compile_result: Option<CompileOutcome>,
        compile_called: Cell<bool>,
    }

    impl StubToolchain {
        fn happy() -> Self {
            Self {
                configure_fails: false,
                compile_result: Some(CompileOutcome::Built),
                compile_called: Cell::new(false),
            }
        }
    }

    impl Toolchain for StubToolchain {
        fn configure(&self, _ctx: &BuildContext) -> Result<(), ConfigureError> {
            if self.configure_fails {
                Err(ConfigureError::NonZeroExit { code: 1 })
            } else {
                Ok(())
            }
        }

        fn compile(&self, _ctx: &BuildContext) -> Result<CompileOutcome, CompileError> {
            self.compile_called.set(true);
            match self.compile_result {
                Some(outcome) => Ok(outcome),
                None => Err(CompileError::ToolNotFound),
            }
        }
    }

    struct CountingConfirm {
        answer: bool,
        asked: usize,
    }

    impl Confirm for CountingConfirm {
        fn confirm(&mut self, _prompt: &str) -> bool {
            self.asked += 1;
            self.answer
        }
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Lay out a workspace whose native tree already has the generated
    /// header, as a successful configure+build would leave it.
    fn workspace_with_header() -> (TempDir, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let native = tmp.path().join("cesium_godot/native");
        let header_dir = native.join("CesiumGltf/generated/include/CesiumGltf");
        fs::create_dir_all(&header_dir).unwrap();
        fs::write(
            header_dir.join("Material.h"),
            "#pragma once\n\nstruct Material {};\n",
        )
        .unwrap();
        let header = header_dir.join("Material.h");
        (tmp, header)
    }

    #[test]
    fn yes_build_walks_every_stage() {
        let (tmp, header) = workspace_with_header();
        let fetcher = StubFetcher::new();
        let toolchain = StubToolchain::happy();
        let mut confirm = CountingConfirm {
            answer: false,
            asked: 0,
        };

        let summary = BuildOrchestrator::new(&fetcher, &toolchain, &mut confirm)
            .run(
                tmp.path(),
                &pairs(&[("compileTarget", "extension"), ("buildCesium", "YES")]),
            )
            .unwrap();

        assert_eq!(
            summary.trace,
            vec![
                Stage::ResolvingParameters,
                Stage::Fetching,
                Stage::Configuring,
                Stage::Compiling,
                Stage::Remediating,
                Stage::Done,
            ]
        );
        assert!(summary.built);
        assert_eq!(confirm.asked, 0);
        // Extension target pins godot-cpp alongside cesium-native.
        let seen = fetcher.seen.borrow();
        assert!(seen.contains(&"godot-cpp".to_string()));
        assert!(seen.contains(&"cesium-native".to_string()));
        // The header got its collision fix.
        let patched = fs::read_to_string(&header).unwrap();
        assert!(patched.contains("#pragma once\n#undef OPAQUE"));
    }

    #[test]
    fn configure_failure_halts_before_compile_and_remediation() {
        let (tmp, header) = workspace_with_header();
        let fetcher = StubFetcher::new();
        let toolchain = StubToolchain {
            configure_fails: true,
            ..StubToolchain::happy()
        };
        let mut confirm = CountingConfirm {
            answer: true,
            asked: 0,
        };

        let err = BuildOrchestrator::new(&fetcher, &toolchain, &mut confirm)
            .run(
                tmp.path(),
                &pairs(&[("compileTarget", "extension"), ("buildCesium", "YES")]),
            )
            .unwrap_err();

        assert_eq!(err.stage, Stage::Configuring);
        assert!(!toolchain.compile_called.get());
        let content = fs::read_to_string(&header).unwrap();
        assert!(!content.contains("#undef OPAQUE"));
    }

    #[test]
    fn explicit_no_short_circuits_to_done() {
        let tmp = TempDir::new().unwrap();
        let fetcher = StubFetcher::new();
        let toolchain = StubToolchain::happy();
        let mut confirm = CountingConfirm {
            answer: true,
            asked: 0,
        };

        let summary = BuildOrchestrator::new(&fetcher, &toolchain, &mut confirm)
            .run(tmp.path(), &pairs(&[("buildCesium", "no")]))
            .unwrap();

        assert_eq!(summary.trace, vec![Stage::ResolvingParameters, Stage::Done]);
        assert!(fetcher.seen.borrow().is_empty());
        assert_eq!(confirm.asked, 0);
    }

    #[test]
    fn unset_decision_defers_to_confirmation() {
        let tmp = TempDir::new().unwrap();
        let fetcher = StubFetcher::new();
        let toolchain = StubToolchain::happy();
        let mut confirm = CountingConfirm {
            answer: false,
            asked: 0,
        };

        let summary = BuildOrchestrator::new(&fetcher, &toolchain, &mut confirm)
            .run(tmp.path(), &pairs(&[]))
            .unwrap();

        assert_eq!(confirm.asked, 1);
        assert_eq!(summary.trace, vec![Stage::ResolvingParameters, Stage::Done]);
    }

    #[test]
    fn compile_failure_still_remediates() {
        let (tmp, header) = workspace_with_header();
        let fetcher = StubFetcher::new();
        let toolchain = StubToolchain {
            compile_result: Some(CompileOutcome::ToolchainFailed { code: 1 }),
            ..StubToolchain::happy()
        };
        let mut confirm = CountingConfirm {
            answer: true,
            asked: 0,
        };

        let summary = BuildOrchestrator::new(&fetcher, &toolchain, &mut confirm)
            .run(tmp.path(), &pairs(&[("buildCesium", "YES")]))
            .unwrap();

        assert!(!summary.built);
        assert!(summary.trace.contains(&Stage::Remediating));
        assert_eq!(*summary.trace.last().unwrap(), Stage::Done);
        let patched = fs::read_to_string(&header).unwrap();
        assert!(patched.contains("#undef OPAQUE"));
    }

    #[test]
    fn missing_build_executable_is_fatal() {
        let (tmp, _header) = workspace_with_header();
        let fetcher = StubFetcher::new();
        let toolchain = StubToolchain {
            compile_result: None,
            ..StubToolchain::happy()
        };
        let mut confirm = CountingConfirm {
            answer: true,
            asked: 0,
        };

        let err = BuildOrchestrator::new(&fetcher, &toolchain, &mut confirm)
            .run(tmp.path(), &pairs(&[("buildCesium", "YES")]))
            .unwrap_err();

        assert_eq!(err.stage, Stage::Compiling);
    }

    #[test]
    fn unknown_compile_target_fails_parameter_resolution() {
        let tmp = TempDir::new().unwrap();
        let fetcher = StubFetcher::new();
        let toolchain = StubToolchain::happy();
        let mut confirm = CountingConfirm {
            answer: true,
            asked: 0,
        };

        let err = BuildOrchestrator::new(&fetcher, &toolchain, &mut confirm)
            .run(tmp.path(), &pairs(&[("compileTarget", "shared")]))
            .unwrap_err();

        assert_eq!(err.stage, Stage::ResolvingParameters);
    }

    #[test]
    fn unsupported_host_still_reaches_done() {
        let tmp = TempDir::new().unwrap();
        let fetcher = StubFetcher::new();
        let toolchain = StubToolchain {
            compile_result: Some(CompileOutcome::UnsupportedHost),
            ..StubToolchain::happy()
        };
        let mut confirm = CountingConfirm {
            answer: true,
            asked: 0,
        };

        // No native tree exists at all; remediation warns and finishes.
        let summary = BuildOrchestrator::new(&fetcher, &toolchain, &mut confirm)
            .run(tmp.path(), &pairs(&[("buildCesium", "YES")]))
            .unwrap();

        assert_eq!(*summary.trace.last().unwrap(), Stage::Done);
        let report = summary.report.unwrap();
        assert!(report.renamed.is_empty());
    }
}
