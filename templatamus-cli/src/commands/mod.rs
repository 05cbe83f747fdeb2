//! Subcommands and the helpers they share.

pub mod init;
pub mod log;
pub mod prompt;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use templatamus_core::{config, ports::Prompter, store, UserConfig};

/// Find the project to operate on.
///
/// An explicit `--dir` must already be tracked. Without one, the current
/// directory is used when tracked; otherwise the operator is asked.
pub fn locate_project(dir: Option<PathBuf>, prompter: &dyn Prompter) -> Result<PathBuf> {
    if let Some(dir) = dir {
        return require_tracked(dir);
    }

    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    if store::is_tracked_project(&cwd) {
        return Ok(cwd);
    }

    println!("No templatamus project found in {}.", cwd.display());
    let answer = prompter
        .input("Where is your project located?", Some("."))
        .context("project location prompt failed")?;
    require_tracked(cwd.join(answer.trim()))
}

fn require_tracked(dir: PathBuf) -> Result<PathBuf> {
    if !store::is_tracked_project(&dir) {
        bail!(
            "{} is not a templatamus project (missing {}); run `templatamus init` there first",
            dir.display(),
            display_relative(&dir, &store::metadata_path(&dir)),
        );
    }
    Ok(dir)
}

/// `~/.templatamus` with environment overrides applied.
pub fn load_config() -> Result<UserConfig> {
    config::load().context("failed to load ~/.templatamus")
}

/// `path` relative to `base` when it lives underneath it.
pub fn display_relative(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}
