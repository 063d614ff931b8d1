//! Locating build executables that may not be on the search path.
//!
//! MSBuild in particular is almost never on PATH; it lives somewhere under
//! the Visual Studio install tree. The locator first probes the bare
//! candidate name with a version query, then falls back to a bounded
//! recursive scan for a matching file name.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::process::Cmd;

/// Find a build executable by probe-then-scan.
///
/// Returns the bare `candidate` when invoking it with `version_arg` exits
/// successfully (it is already on the search path). Otherwise walks
/// `fallback_root` and returns the first file whose name matches `pattern`
/// (`*` wildcards, case-insensitive). With multiple matches the winner is
/// filesystem-order dependent; callers must not rely on a particular one.
///
/// `None` means the root is missing, empty, or holds no match. No caching;
/// this runs at most once per process.
pub fn find_executable(
    candidate: &str,
    version_arg: &str,
    fallback_root: &Path,
    pattern: &str,
) -> Option<PathBuf> {
    if let Ok(result) = Cmd::new(candidate).arg(version_arg).allow_fail().run() {
        if result.success() {
            return Some(PathBuf::from(candidate));
        }
    }

    if !fallback_root.exists() {
        return None;
    }

    WalkDir::new(fallback_root)
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

/// Case-insensitive file-name match with `*` wildcards.
pub fn wildcard_match(name: &str, pattern: &str) -> bool {
    let name: Vec<char> = name.to_ascii_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_ascii_lowercase().chars().collect();

    // Greedy match with backtracking to the last `*`.
    let (mut n, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while n < name.len() {
        if p < pattern.len() && (pattern[p] == name[n] || pattern[p] == '?') {
            n += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((star_p, star_n)) = star {
            p = star_p + 1;
            n = star_n + 1;
            star = Some((star_p, star_n + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn wildcard_matching() {
        assert!(wildcard_match("MSBuild.exe", "*MSBuild.exe"));
        assert!(wildcard_match("msbuild.exe", "*MSBuild.exe"));
        assert!(wildcard_match("CesiumGltf-x64.lib", "CesiumGltf*.lib"));
        assert!(wildcard_match("CesiumGltf.lib", "CesiumGltf*.lib"));
        assert!(!wildcard_match("CesiumAsync.lib", "CesiumGltf*.lib"));
        assert!(!wildcard_match("MSBuild.exe.bak", "*MSBuild.exe"));
    }

    #[test]
    fn candidate_on_path_is_returned_verbatim() {
        let tmp = TempDir::new().unwrap();
        // `true` accepts any argument and exits 0, standing in for a
        // version-query that succeeds.
        let found = find_executable("true", "--version", tmp.path(), "*MSBuild.exe");
        assert_eq!(found, Some(PathBuf::from("true")));
    }

    #[test]
    fn nested_match_under_fallback_root_is_found() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("2022/MSBuild/Current/Bin");
        fs::create_dir_all(&nested).unwrap();
        let exe = nested.join("MSBuild.exe");
        fs::write(&exe, "").unwrap();

        let found = find_executable(
            "definitely-not-a-real-tool-xyz",
            "-version",
            tmp.path(),
            "*MSBuild.exe",
        );
        assert_eq!(found, Some(exe));
    }

    #[test]
    fn no_match_returns_none() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();
        let found = find_executable(
            "definitely-not-a-real-tool-xyz",
            "-version",
            tmp.path(),
            "*MSBuild.exe",
        );
        assert_eq!(found, None);
    }

    #[test]
    fn missing_root_returns_none() {
        let found = find_executable(
            "definitely-not-a-real-tool-xyz",
            "-version",
            Path::new("/no/such/root"),
            "*MSBuild.exe",
        );
        assert_eq!(found, None);
    }
}
