//! Installing the statically linked packages cesium-native links against.
//!
//! The packages come from an ezvcpkg cache: a `.ezvcpkg` directory at the
//! drive root holding one subdirectory per vcpkg version. The newest
//! subdirectory carries the vcpkg executable to use. Install failures are
//! per-package warnings; the consumer link step surfaces real absences.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::process::Cmd;

/// Packages installed for the static Windows triplet.
pub const STATIC_PACKAGES: &[&str] = &["curl", "uriparser", "ada-url"];

const VCPKG_EXE: &str = if cfg!(windows) { "vcpkg.exe" } else { "vcpkg" };

/// Default ezvcpkg cache location at the drive root.
pub fn default_cache_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\.ezvcpkg")
    } else {
        PathBuf::from("/.ezvcpkg")
    }
}

/// Find the vcpkg executable in the newest version directory of the cache.
///
/// Returns `None` when the cache is absent or holds no usable version;
/// the caller reports that installing dependencies needs a full build run.
pub fn find_vcpkg(cache_root: &Path) -> Option<PathBuf> {
    if !cache_root.exists() {
        eprintln!(
            "[WARN] ezvcpkg cache not found at {}, run with buildCesium=YES to install dependencies",
            cache_root.display()
        );
        return None;
    }

    let mut versions: Vec<(SystemTime, PathBuf)> = fs::read_dir(cache_root)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((modified, entry.path()))
        })
        .collect();
    versions.sort_by(|a, b| b.0.cmp(&a.0));

    let (_, latest) = versions.into_iter().next()?;
    let exe = latest.join(VCPKG_EXE);
    if exe.exists() {
        Some(exe)
    } else {
        None
    }
}

/// Install the static package set, collecting a warning per failure.
pub fn install_static_packages(vcpkg: &Path, triplet: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    for package in STATIC_PACKAGES {
        let spec = format!("{}:{}", package, triplet);
        println!("[cesium] Installing {}...", spec);
        let failed = match Cmd::new(vcpkg.display().to_string())
            .arg("install")
            .arg(&spec)
            .allow_fail()
            .run_interactive()
        {
            Ok(Some(0)) => false,
            Ok(code) => {
                warnings.push(format!(
                    "vcpkg install {} exited with {:?}",
                    spec, code
                ));
                true
            }
            Err(e) => {
                warnings.push(format!("vcpkg install {} could not run: {}", spec, e));
                true
            }
        };
        if failed {
            eprintln!("[WARN] {}", warnings.last().unwrap());
        }
    }
    warnings
}
