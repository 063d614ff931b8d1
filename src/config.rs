//! Optional TOML defaults for build parameters.
//!
//! A `cesium-build.toml` next to the workspace can pin the parameters a
//! pipeline would otherwise pass on every invocation. Command-line pairs
//! always override file values; a missing file is not an error.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File name probed in the workspace root when no explicit path is given.
pub const DEFAULT_CONFIG_NAME: &str = "cesium-build.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfigFile {
    /// `module` or `extension`.
    pub compile_target: Option<String>,
    /// `single` or `double`.
    pub precision: Option<String>,
    /// Explicit build decision; absent keeps the interactive fallback.
    pub build_cesium: Option<bool>,
}

impl BuildConfigFile {
    /// Render as parameter pairs, in the same form the pipeline passes.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(target) = &self.compile_target {
            pairs.push(("compileTarget".to_string(), target.clone()));
        }
        if let Some(precision) = &self.precision {
            pairs.push(("precision".to_string(), precision.clone()));
        }
        if let Some(build) = self.build_cesium {
            let value = if build { "YES" } else { "NO" };
            pairs.push(("buildCesium".to_string(), value.to_string()));
        }
        pairs
    }
}

/// Load a config file, or defaults if it does not exist.
pub fn load_config(path: &Path) -> Result<BuildConfigFile> {
    if !path.exists() {
        return Ok(BuildConfigFile::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading build config '{}'", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing build config '{}'", path.display()))
}
