//! Pinned third-party repositories.
//!
//! Every native dependency is fetched at exactly one revision: the branch
//! gives `git clone` a cheap starting point, the commit is what the working
//! copy is hard-reset to. Whatever the branch later points at is irrelevant.

use std::path::{Path, PathBuf};

use crate::params::{BuildContext, CompileTarget};

const CESIUM_NATIVE_URL: &str = "https://github.com/CesiumGS/cesium-native.git";
const CESIUM_NATIVE_BRANCH: &str = "main";
const CESIUM_NATIVE_COMMIT: &str = "8c7b7f64f0a3a1b37dbb3fa62e1d0a4bfc2e4d19";

const GODOT_CPP_URL: &str = "https://github.com/godotengine/godot-cpp";
const GODOT_CPP_BRANCH: &str = "4.1";
const GODOT_CPP_COMMIT: &str = "2c4e2b67b2a55c046e2cba95b8f28bd68e9d27ff";

const LITEHTML_URL: &str = "https://github.com/litehtml/litehtml.git";
const LITEHTML_BRANCH: &str = "master";
const LITEHTML_COMMIT: &str = "a0f2d70b1a6a6cc47e3b5bbca6c5f0dfd1c0e3b2";

/// One pinned dependency: where it comes from and where it lands.
///
/// Immutable once constructed; the fetch stage must leave the working copy
/// with HEAD at `commit`.
#[derive(Debug, Clone)]
pub struct RevisionPin {
    pub url: String,
    pub branch: String,
    pub commit: String,
    /// Checkout location, relative to the workspace root.
    pub local_dir: PathBuf,
    pub display_name: String,
}

impl RevisionPin {
    fn new(url: &str, branch: &str, commit: &str, local_dir: PathBuf, name: &str) -> Self {
        assert!(!commit.is_empty(), "pinned commit must never be empty");
        Self {
            url: url.to_string(),
            branch: branch.to_string(),
            commit: commit.to_string(),
            local_dir,
            display_name: name.to_string(),
        }
    }

    /// Absolute checkout path under a workspace root.
    pub fn local_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.local_dir)
    }
}

/// The pinned dependency set for a resolved build context.
///
/// godot-cpp is only needed for the GDExtension target; an engine-module
/// build compiles inside the engine tree and brings its own bindings.
pub fn pinned_dependencies(ctx: &BuildContext) -> Vec<RevisionPin> {
    let mut pins = Vec::new();

    if ctx.compile_target == CompileTarget::Extension {
        pins.push(RevisionPin::new(
            GODOT_CPP_URL,
            GODOT_CPP_BRANCH,
            GODOT_CPP_COMMIT,
            PathBuf::from("godot-cpp"),
            "godot-cpp",
        ));
    }

    let native_rel = ctx
        .native_dir
        .strip_prefix(&ctx.workspace_root)
        .unwrap_or(&ctx.native_dir)
        .to_path_buf();
    pins.push(RevisionPin::new(
        CESIUM_NATIVE_URL,
        CESIUM_NATIVE_BRANCH,
        CESIUM_NATIVE_COMMIT,
        native_rel,
        "cesium-native",
    ));

    pins.push(RevisionPin::new(
        LITEHTML_URL,
        LITEHTML_BRANCH,
        LITEHTML_COMMIT,
        PathBuf::from("litehtml"),
        "litehtml",
    ));

    pins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BuildDecision, BuildParameters, Precision};

    fn ctx(target: CompileTarget) -> BuildContext {
        let params = BuildParameters {
            compile_target: target,
            precision: Precision::Single,
            build: BuildDecision::Yes,
        };
        BuildContext::resolve(Path::new("/work"), &params)
    }

    #[test]
    fn extension_target_pins_godot_cpp() {
        let pins = pinned_dependencies(&ctx(CompileTarget::Extension));
        assert!(pins.iter().any(|p| p.display_name == "godot-cpp"));
    }

    #[test]
    fn module_target_does_not_pin_godot_cpp() {
        let pins = pinned_dependencies(&ctx(CompileTarget::Module));
        assert!(!pins.iter().any(|p| p.display_name == "godot-cpp"));
    }

    #[test]
    fn native_checkout_lives_under_the_target_root() {
        let pins = pinned_dependencies(&ctx(CompileTarget::Module));
        let native = pins
            .iter()
            .find(|p| p.display_name == "cesium-native")
            .unwrap();
        assert_eq!(
            native.local_path(Path::new("/work")),
            Path::new("/work/modules/cesium_godot/native")
        );
    }

    #[test]
    fn every_pin_carries_a_commit() {
        for pin in pinned_dependencies(&ctx(CompileTarget::Extension)) {
            assert!(!pin.commit.is_empty(), "{} has no commit", pin.display_name);
        }
    }
}
