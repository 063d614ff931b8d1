//! Build parameters and the resolved build context.
//!
//! Parameters arrive from the invoking pipeline as `KEY=VALUE` pairs (the
//! same surface SCons exposes to the plugin build). They are parsed once at
//! startup into [`BuildParameters`] and then resolved into an explicit
//! [`BuildContext`] that is threaded through every stage; no stage reads
//! global state.

use std::path::{Path, PathBuf};

use crate::error::ParameterError;

/// Root of the plugin tree when built as a GDExtension.
pub const ROOT_DIR_EXT: &str = "cesium_godot";

/// Root of the plugin tree when built as an engine module.
pub const ROOT_DIR_MODULE: &str = "modules/cesium_godot";

/// Preprocessor define selecting the engine-module build of the plugin.
pub const CESIUM_MODULE_DEF: &str = "CESIUM_GD_MODULE";

/// Preprocessor define selecting the GDExtension build of the plugin.
pub const CESIUM_EXT_DEF: &str = "CESIUM_GD_EXT";

/// Define the consumer adds when the engine uses double-precision reals.
pub const DOUBLE_PRECISION_DEF: &str = "REAL_T_IS_DOUBLE";

/// Build profile handed to the native toolchain.
pub const RELEASE_CONFIG: &str = "RelWithDebInfo";

/// vcpkg platform triplet for statically linked Windows packages.
pub const STATIC_TRIPLET: &str = "x64-windows-static";

/// How the plugin is being compiled into Godot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileTarget {
    /// Built into the engine source tree as a module.
    Module,
    /// Built against godot-cpp as a GDExtension (the default).
    Extension,
}

impl CompileTarget {
    /// Parse the `compileTarget` parameter value.
    ///
    /// An absent or empty value means Extension; any string other than
    /// `module` / `extension` is a fatal parameter error.
    pub fn parse(value: Option<&str>) -> Result<Self, ParameterError> {
        match value.unwrap_or("") {
            "" | "extension" => Ok(Self::Extension),
            "module" => Ok(Self::Module),
            other => Err(ParameterError::UnknownCompileTarget {
                value: other.to_string(),
            }),
        }
    }

    /// Plugin root directory, relative to the workspace.
    pub fn root_dir(self) -> &'static str {
        match self {
            Self::Module => ROOT_DIR_MODULE,
            Self::Extension => ROOT_DIR_EXT,
        }
    }

    /// Preprocessor define the consumer build adds for this target.
    pub fn define(self) -> &'static str {
        match self {
            Self::Module => CESIUM_MODULE_DEF,
            Self::Extension => CESIUM_EXT_DEF,
        }
    }
}

/// Numeric precision of the consuming engine build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Single,
    Double,
}

impl Precision {
    /// Parse the `precision` parameter value; anything but `double` is single.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("double") => Self::Double,
            _ => Self::Single,
        }
    }
}

/// Whether to build the native dependencies at all.
///
/// `Unset` is resolved through a [`Confirm`] collaborator supplied by the
/// caller; the orchestrator itself never reads stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildDecision {
    Yes,
    No,
    Unset,
}

impl BuildDecision {
    /// Parse the `buildCesium` parameter value.
    ///
    /// `YES` and `TRUE` (any case) opt in, any other present value opts
    /// out, and an absent value defers to interactive confirmation.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None => Self::Unset,
            Some(v) if v.eq_ignore_ascii_case("yes") || v.eq_ignore_ascii_case("true") => Self::Yes,
            Some(_) => Self::No,
        }
    }
}

/// Asks the user a yes/no question.
///
/// Injected into the orchestrator so interactive confirmation is a caller
/// capability rather than embedded logic; non-interactive pipelines pass a
/// fixed answer.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Confirmation that always returns a fixed answer.
pub struct FixedConfirm(pub bool);

impl Confirm for FixedConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        self.0
    }
}

/// Validated build parameters, read-only after construction.
#[derive(Debug, Clone, Copy)]
pub struct BuildParameters {
    pub compile_target: CompileTarget,
    pub precision: Precision,
    pub build: BuildDecision,
}

impl BuildParameters {
    /// Build from `KEY=VALUE` pairs, later pairs overriding earlier ones.
    ///
    /// Unknown keys are ignored; the invoking pipeline passes plenty of its
    /// own. An unrecognized `compileTarget` value is fatal.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ParameterError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut compile_target = None;
        let mut precision = None;
        let mut build = None;
        for (key, value) in pairs {
            match key {
                "compileTarget" => compile_target = Some(value.to_string()),
                "precision" => precision = Some(value.to_string()),
                "buildCesium" => build = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(Self {
            compile_target: CompileTarget::parse(compile_target.as_deref())?,
            precision: Precision::parse(precision.as_deref()),
            build: BuildDecision::parse(build.as_deref()),
        })
    }
}

/// Everything the pipeline stages need to know about where and what to build.
///
/// Resolved once from [`BuildParameters`] and passed explicitly to every
/// component.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Directory the orchestrator was invoked against.
    pub workspace_root: PathBuf,
    /// Plugin root for the selected compile target.
    pub root_dir: PathBuf,
    /// cesium-native checkout inside the plugin root.
    pub native_dir: PathBuf,
    pub compile_target: CompileTarget,
    pub precision: Precision,
    /// Named build profile handed to the compiler.
    pub build_config: &'static str,
}

impl BuildContext {
    pub fn resolve(workspace_root: &Path, params: &BuildParameters) -> Self {
        let root_dir = workspace_root.join(params.compile_target.root_dir());
        let native_dir = root_dir.join("native");
        Self {
            workspace_root: workspace_root.to_path_buf(),
            root_dir,
            native_dir,
            compile_target: params.compile_target,
            precision: params.precision,
            build_config: RELEASE_CONFIG,
        }
    }

    /// Define the consumer build adds for the selected target.
    pub fn target_define(&self) -> &'static str {
        self.compile_target.define()
    }
}
