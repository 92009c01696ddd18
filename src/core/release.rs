//! Release marker: a small `key=value` file describing the source checkout
//! a build came from.
//!
//! The file is rewritten only when its content would change, and the file
//! itself is ignored when deciding whether the working tree is dirty, so
//! repeated runs against an unchanged checkout leave it untouched.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::command::CommandRunner;
use crate::defaults::Defaults;
use crate::error::Result;
use crate::git::Git;
use crate::io;

pub const DIRTY_WARNING: &str = "working tree contains uncommitted changes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseInfo {
    pub toplevel: String,
    pub commit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub date: String,
    pub dirty: bool,
}

impl ReleaseInfo {
    /// `tag: v1.2, branch: main`, or `None` when neither is known.
    pub fn annotation(&self) -> Option<String> {
        let parts: Vec<String> = [
            self.tag.as_ref().map(|t| format!("tag: {}", t)),
            self.branch.as_ref().map(|b| format!("branch: {}", b)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let commit = match self.annotation() {
            Some(annotation) => format!("{} ({})", self.commit, annotation),
            None => self.commit.clone(),
        };

        let mut lines = vec![
            format!("toplevel={}", self.toplevel),
            format!("commit={}", commit),
            format!("date={}", self.date),
        ];
        if self.dirty {
            lines.push(format!("warning={}", DIRTY_WARNING));
        }
        lines
    }

    pub fn render(&self) -> String {
        let mut content = self.lines().join("\n");
        content.push('\n');
        content
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseOutput {
    pub path: String,
    pub updated: bool,
    pub lines: Vec<String>,
    pub info: ReleaseInfo,
}

/// Describe HEAD of the checkout, ignoring `ignore_path` (relative to the
/// repository root) when checking for uncommitted changes.
pub fn describe(git: &Git<'_>, toplevel: &str, ignore_path: Option<&str>) -> Result<ReleaseInfo> {
    let dirty = git
        .changed_paths()?
        .iter()
        .any(|path| Some(path.as_str()) != ignore_path);

    Ok(ReleaseInfo {
        toplevel: toplevel.to_string(),
        commit: git.head_commit()?,
        tag: git.exact_tag()?,
        branch: git.current_branch()?,
        date: git.head_commit_date()?,
        dirty,
    })
}

/// Resolve the release file against the repository root.
pub fn resolve_file(toplevel: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        toplevel.join(path)
    }
}

/// Path of `file` relative to `toplevel` with `/` separators, as git reports it.
fn repo_relative(toplevel: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(toplevel).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Some(parts.join("/"))
}

/// Regenerate the release file for the checkout containing `dir`.
pub fn update(
    dir: &Path,
    file_override: Option<&str>,
    defaults: &Defaults,
    runner: &dyn CommandRunner,
) -> Result<ReleaseOutput> {
    let git = Git::new(&defaults.tools.git, dir, runner);
    let toplevel = git.toplevel()?;
    let toplevel_path = Path::new(&toplevel);

    let file = file_override.unwrap_or(defaults.release.file.as_str());
    let path = resolve_file(toplevel_path, file);
    let ignore = repo_relative(toplevel_path, &path);

    let info = describe(&git, &toplevel, ignore.as_deref())?;
    let candidate = info.render();

    let existing = io::read_file_optional(&path, "read release file")?;
    let updated = existing.as_deref() != Some(candidate.as_str());

    if updated {
        io::write_file_atomic(&path, &candidate, "write release file")?;
        log_status!("release", "Updated {}", path.display());
    } else {
        log_status!("release", "{} is up to date", path.display());
    }

    Ok(ReleaseOutput {
        path: path.display().to_string(),
        updated,
        lines: info.lines(),
        info,
    })
}
