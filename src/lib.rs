//! Build orchestrator for the native dependencies of Cesium for Godot.
//!
//! The plugin links against cesium-native (and, for the GDExtension target,
//! godot-cpp), which must be fetched at pinned revisions, configured and
//! compiled by the external CMake/MSBuild toolchain, and then have their
//! generated artifacts fixed up before the consumer build can use them.
//! This crate sequences that work:
//!
//! - **Pins and fetching** - each dependency has exactly one pinned commit;
//!   a checkout counts as fetched only when HEAD matches the pin
//! - **Toolchain drive** - CMake configure and MSBuild compile as child
//!   processes, with MSBuild located by a probe-then-scan search
//! - **Remediation** - generated-header patching (`#undef OPAQUE`) and
//!   renaming of built `Cesium*` libraries to the module naming convention
//! - **Orchestration** - a sequential state machine with per-stage failure
//!   policy: configure failure halts, compile failure does not
//!
//! Runs are idempotent: already-pinned checkouts, already-patched headers,
//! and already-renamed libraries are all recognized and skipped, so the
//! orchestrator is safe to re-run after a partial failure. It assumes
//! exclusive ownership of the directories it manages; concurrent
//! invocations against one workspace are unsupported.

pub mod config;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod params;
pub mod pins;
pub mod preflight;
pub mod process;
pub mod remediate;
pub mod toolchain;

pub use orchestrator::{BuildOrchestrator, RunSummary, Stage, StageFailure};
pub use params::{BuildContext, BuildDecision, BuildParameters, CompileTarget, Confirm, Precision};
pub use pins::RevisionPin;
