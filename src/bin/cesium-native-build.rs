use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use cesium_native_build::config::{load_config, DEFAULT_CONFIG_NAME};
use cesium_native_build::fetch::GitFetcher;
use cesium_native_build::orchestrator::BuildOrchestrator;
use cesium_native_build::params::{BuildDecision, Confirm};
use cesium_native_build::preflight;
use cesium_native_build::process::ensure_exists;
use cesium_native_build::toolchain::NativeToolchain;

fn usage() -> &'static str {
    "Usage:\n  cesium-native-build [--workspace <dir>] [--config <file>] [--yes|--no] [KEY=VALUE]...\n\nParameters:\n  compileTarget=<module|extension>   how the plugin is built (default extension)\n  precision=<single|double>          engine real precision (default single)\n  buildCesium=<YES|NO>               build without prompting"
}

/// Interactive confirmation on the controlling terminal.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{}", prompt);
        let _ = io::stdout().flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().chars().next(), Some('y') | Some('Y'))
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut workspace: PathBuf =
        std::env::current_dir().context("could not determine the current directory")?;
    let mut config_path: Option<PathBuf> = None;
    let mut cli_pairs: Vec<(String, String)> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("{}", usage());
                return Ok(());
            }
            "--workspace" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--workspace needs a directory\n\n{}", usage())
                })?;
                workspace = PathBuf::from(value);
            }
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config needs a file\n\n{}", usage()))?;
                config_path = Some(PathBuf::from(value));
            }
            "--yes" => cli_pairs.push(("buildCesium".to_string(), "YES".to_string())),
            "--no" => cli_pairs.push(("buildCesium".to_string(), "NO".to_string())),
            other => match other.split_once('=') {
                Some((key, value)) => {
                    cli_pairs.push((key.to_string(), value.to_string()));
                }
                None => bail!("unrecognized argument '{}'\n\n{}", other, usage()),
            },
        }
    }

    ensure_exists(&workspace, "Workspace directory")?;
    let config_path = config_path.unwrap_or_else(|| workspace.join(DEFAULT_CONFIG_NAME));
    let config = load_config(&config_path)?;

    // File defaults first, command line overrides.
    let mut pairs = config.to_pairs();
    pairs.append(&mut cli_pairs);

    // Host tools only matter when a build can actually happen.
    let decision = pairs
        .iter()
        .rev()
        .find(|(key, _)| key == "buildCesium")
        .map(|(_, value)| BuildDecision::parse(Some(value)))
        .unwrap_or(BuildDecision::Unset);
    if decision != BuildDecision::No {
        preflight::check_host_tools()?;
    }

    let fetcher = GitFetcher;
    let toolchain = NativeToolchain;
    let mut confirm = StdinConfirm;
    let summary = BuildOrchestrator::new(&fetcher, &toolchain, &mut confirm)
        .run(&workspace, &pairs)
        .map_err(anyhow::Error::new)?;

    if let Some(report) = &summary.report {
        if !report.warnings.is_empty() {
            eprintln!(
                "[WARN] Finished with {} warning(s); see output above",
                report.warnings.len()
            );
        }
    }
    Ok(())
}
