//! Post-build remediation of generated artifacts.
//!
//! Two independent fixups run after the native toolchain:
//!
//! - **Header patching** - cesium-native's generated `Material.h` defines an
//!   `OPAQUE` symbol that collides with the engine's; an `#undef` is inserted
//!   right after the include guard so consumers can compile against it.
//! - **Library renaming** - built `Cesium*` static libraries are renamed in
//!   place to the naming convention the Godot module loader expects.
//!
//! Patching is preconditioned on the insertion being absent, so repeated
//! runs are true no-ops. Renaming is best-effort per module: a missing
//! artifact is a recorded warning, not a failure.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::RemediationError;
use crate::toolchain::locate::wildcard_match;

/// Include-guard line the `#undef` is inserted after.
pub const HEADER_MARKER: &str = "#pragma once";

/// Inserted directive removing the engine symbol collision.
pub const OPAQUE_UNDEF: &str = "\n#undef OPAQUE";

/// Substring marking an immediate subdirectory as a module build output.
const MODULE_DIR_MARKER: &str = "Cesium";

/// The one generated header known to collide with engine symbols.
pub fn material_header_path(native_dir: &Path) -> PathBuf {
    native_dir.join("CesiumGltf/generated/include/CesiumGltf/Material.h")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched,
    /// The insertion already follows the marker; the file was not touched.
    AlreadyPatched,
}

/// Insert `insertion` immediately after the first occurrence of `marker`.
///
/// A file already carrying the insertion after the marker is left unchanged,
/// so re-running the pipeline never duplicates the directive.
pub fn patch_header(
    path: &Path,
    marker: &str,
    insertion: &str,
) -> Result<PatchOutcome, RemediationError> {
    let content = fs::read_to_string(path).map_err(|source| RemediationError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let patched_form = format!("{}{}", marker, insertion);
    if content.contains(&patched_form) {
        return Ok(PatchOutcome::AlreadyPatched);
    }

    let start = content
        .find(marker)
        .ok_or_else(|| RemediationError::MarkerNotFound {
            marker: marker.to_string(),
            path: path.to_path_buf(),
        })?;
    let end = start + marker.len();

    let mut patched = String::with_capacity(content.len() + insertion.len());
    patched.push_str(&content[..end]);
    patched.push_str(insertion);
    patched.push_str(&content[end..]);

    fs::write(path, patched).map_err(|source| RemediationError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PatchOutcome::Patched)
}

/// Target naming convention for renamed libraries:
/// `<module>.<platform>.<build_type>.<variant>.<arch>.<extension>`.
#[derive(Debug, Clone)]
pub struct LibraryNaming {
    pub platform: &'static str,
    pub build_type: &'static str,
    pub variant: &'static str,
    pub arch: &'static str,
    pub extension: &'static str,
}

impl Default for LibraryNaming {
    fn default() -> Self {
        Self {
            platform: "windows",
            build_type: "editor",
            variant: "dev",
            arch: "x86_64",
            extension: "lib",
        }
    }
}

impl LibraryNaming {
    pub fn target_file_name(&self, module: &str) -> String {
        format!(
            "{}.{}.{}.{}.{}.{}",
            module, self.platform, self.build_type, self.variant, self.arch, self.extension
        )
    }
}

/// What the rename pass did and what it could not find.
#[derive(Debug, Default)]
pub struct RenameReport {
    pub renamed: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Rename built module libraries under `search_root` to the target naming.
///
/// Immediate subdirectories whose name contains `Cesium` are module output
/// directories. For each, a bounded recursive search finds the first file
/// matching `<module>*.<ext>` (order is filesystem-dependent) and renames it
/// in place. Modules without a matching artifact are recorded as warnings
/// and the pass continues; an actual rename failure is fatal.
pub fn rename_libraries(
    search_root: &Path,
    naming: &LibraryNaming,
) -> Result<RenameReport, RemediationError> {
    let mut report = RenameReport::default();

    if !search_root.exists() {
        report.warnings.push(format!(
            "no build output at {}, nothing to rename",
            search_root.display()
        ));
        return Ok(report);
    }

    let entries = fs::read_dir(search_root).map_err(|source| RemediationError::Scan {
        path: search_root.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| RemediationError::Scan {
            path: search_root.to_path_buf(),
            source,
        })?;
        let module_dir = entry.path();
        if !module_dir.is_dir() {
            continue;
        }
        let Some(module) = module_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !module.contains(MODULE_DIR_MARKER) {
            continue;
        }

        let pattern = format!("{}*.{}", module, naming.extension);
        let Some(lib_path) = first_match(&module_dir, &pattern) else {
            let warning = format!(
                "Could not find built library for module {}, try recompiling native",
                module
            );
            eprintln!("[WARN] {}", warning);
            report.warnings.push(warning);
            continue;
        };

        let target_name = naming.target_file_name(module);
        if lib_path.file_name().and_then(|n| n.to_str()) == Some(target_name.as_str()) {
            // Already conformant from a previous run.
            continue;
        }
        let target = lib_path
            .parent()
            .unwrap_or(&module_dir)
            .join(&target_name);
        fs::rename(&lib_path, &target).map_err(|source| RemediationError::Rename {
            from: lib_path.clone(),
            to: target.clone(),
            source,
        })?;
        println!(
            "[cesium] Renamed {} -> {}",
            lib_path.display(),
            target.display()
        );
        report.renamed.push(target);
    }

    Ok(report)
}

/// First file under `root` whose name matches the wildcard pattern.
fn first_match(root: &Path, pattern: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| wildcard_match(name, pattern))
        })
        .map(|entry| entry.into_path())
}
