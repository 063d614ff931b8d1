//! Driving the external configure and compile tools.
//!
//! cesium-native is configured with CMake and compiled with MSBuild; both
//! are child processes whose exit status is the only contract. Configure
//! failure is fatal to the pipeline. Compile failure is not: remediation
//! still runs afterwards, because even a partially built tree may have
//! generated headers that need patching before the next attempt.

pub mod locate;
pub mod vcpkg;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CompileError, ConfigureError};
use crate::params::{BuildContext, STATIC_TRIPLET};
use crate::process::Cmd;

/// Solution file CMake generates at the top of the native tree.
pub const SOLUTION_NAME: &str = "cesium-native.sln";

const MSBUILD_CANDIDATE: &str = "msbuild";
const MSBUILD_VERSION_ARG: &str = "-version";
const MSBUILD_PATTERN: &str = "*MSBuild.exe";
const VS_SEARCH_ROOT: &str = "C:\\Program Files\\Microsoft Visual Studio";

/// Result of a compile attempt that was allowed to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    Built,
    /// The build executable ran and exited non-zero. Non-fatal.
    ToolchainFailed { code: i32 },
    /// Compilation is only defined for Windows hosts. Non-fatal.
    UnsupportedHost,
}

/// Configure/compile seam the orchestrator drives.
pub trait Toolchain {
    fn configure(&self, ctx: &BuildContext) -> Result<(), ConfigureError>;
    fn compile(&self, ctx: &BuildContext) -> Result<CompileOutcome, CompileError>;
}

/// Production toolchain: vcpkg + CMake + MSBuild.
pub struct NativeToolchain;

impl Toolchain for NativeToolchain {
    fn configure(&self, ctx: &BuildContext) -> Result<(), ConfigureError> {
        // Static link dependencies first; failures are warnings because the
        // packages may already be present in the cache.
        if let Some(vcpkg) = vcpkg::find_vcpkg(&vcpkg::default_cache_root()) {
            vcpkg::install_static_packages(&vcpkg, STATIC_TRIPLET);
        }

        println!("[cesium] Configuring cesium-native...");
        run_cmake(&ctx.native_dir, &configure_defines())?;
        println!("[cesium] Configuration completed without any errors!");
        Ok(())
    }

    fn compile(&self, ctx: &BuildContext) -> Result<CompileOutcome, CompileError> {
        if !cfg!(windows) {
            eprintln!(
                "[WARN] Compiling for platform {} is not yet supported!",
                std::env::consts::OS
            );
            return Ok(CompileOutcome::UnsupportedHost);
        }

        let msbuild = locate::find_executable(
            MSBUILD_CANDIDATE,
            MSBUILD_VERSION_ARG,
            Path::new(VS_SEARCH_ROOT),
            MSBUILD_PATTERN,
        )
        .ok_or(CompileError::ToolNotFound)?;

        println!("[cesium] Compiling cesium-native, this might take a few minutes...");
        let code = Cmd::new(msbuild.display().to_string())
            .arg(SOLUTION_NAME)
            .arg(format!("/property:Configuration={}", ctx.build_config))
            .current_dir(&ctx.native_dir)
            .allow_fail()
            .run_interactive()
            .map_err(CompileError::Launch)?;

        match code {
            Some(0) => Ok(CompileOutcome::Built),
            code => Ok(CompileOutcome::ToolchainFailed {
                code: code.unwrap_or(-1),
            }),
        }
    }
}

/// The fixed generator defines for cesium-native.
pub fn configure_defines() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "CESIUM_MSVC_STATIC_RUNTIME_ENABLED".to_string(),
            "ON".to_string(),
        ),
        ("VCPKG_TRIPLET".to_string(), STATIC_TRIPLET.to_string()),
    ])
}

/// Run the build-file generator in `native_dir` with `-D<KEY>=<VALUE>`
/// tokens for every define.
pub fn run_cmake(
    native_dir: &Path,
    defines: &BTreeMap<String, String>,
) -> Result<(), ConfigureError> {
    let mut cmd = Cmd::new("cmake");
    for (key, value) in defines {
        cmd = cmd.arg(format!("-D{}={}", key, value));
    }
    let code = cmd
        .arg(".")
        .current_dir(native_dir)
        .env("VCPKG_TRIPLET", STATIC_TRIPLET)
        .allow_fail()
        .run_interactive()
        .map_err(ConfigureError::Launch)?;

    match code {
        Some(0) => Ok(()),
        code => Err(ConfigureError::NonZeroExit {
            code: code.unwrap_or(-1),
        }),
    }
}
