//! Git primitives used to describe the source checkout.

use std::path::Path;

use crate::command::{self, CommandRunner, Invocation};
use crate::error::{Error, Result};

pub struct Git<'a> {
    program: &'a str,
    dir: &'a Path,
    runner: &'a dyn CommandRunner,
}

impl<'a> Git<'a> {
    pub fn new(program: &'a str, dir: &'a Path, runner: &'a dyn CommandRunner) -> Self {
        Self {
            program,
            dir,
            runner,
        }
    }

    fn invocation(&self, args: &[&str]) -> Invocation {
        Invocation::new(self.program)
            .args(args.iter().copied())
            .current_dir(self.dir)
    }

    /// Untrimmed stdout; failures carry git's own message.
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.runner.output(&self.invocation(args))?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(Error::git_command_failed(format!(
                "git {} failed: {}",
                args.join(" "),
                output.error_text()
            )))
        }
    }

    fn required(&self, args: &[&str]) -> Result<String> {
        self.run(args).map(|stdout| stdout.trim().to_string())
    }

    /// Root directory of the repository.
    pub fn toplevel(&self) -> Result<String> {
        self.required(&["rev-parse", "--show-toplevel"])
    }

    /// Full hash of HEAD.
    pub fn head_commit(&self) -> Result<String> {
        self.required(&["rev-parse", "HEAD"])
    }

    /// Strict ISO 8601 committer date of HEAD.
    pub fn head_commit_date(&self) -> Result<String> {
        self.required(&["log", "-1", "--format=%cI"])
    }

    /// Tag pointing exactly at HEAD, if any.
    pub fn exact_tag(&self) -> Result<Option<String>> {
        command::run_optional(
            self.runner,
            &self.invocation(&["describe", "--tags", "--exact-match", "HEAD"]),
        )
    }

    /// Current branch; `None` on a detached HEAD.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let branch = command::run_optional(
            self.runner,
            &self.invocation(&["rev-parse", "--abbrev-ref", "HEAD"]),
        )?;
        Ok(branch.filter(|b| b != "HEAD"))
    }

    /// Paths with uncommitted changes (staged, unstaged or untracked),
    /// relative to the repository root. Untracked directories are listed
    /// file by file.
    pub fn changed_paths(&self) -> Result<Vec<String>> {
        let stdout = self.run(&["status", "--porcelain", "-z", "--untracked-files=all"])?;
        Ok(parse_porcelain_z(&stdout))
    }
}

/// Paths from NUL-separated `git status --porcelain -z` (v1) output.
///
/// Paths arrive verbatim. Renames and copies report the new path; the
/// entry after them holds the source path and is skipped.
pub fn parse_porcelain_z(stdout: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut entries = stdout.split('\0');
    while let Some(entry) = entries.next() {
        let (Some(status), Some(path)) = (entry.get(..2), entry.get(3..)) else {
            continue;
        };
        if status.contains(|c: char| c == 'R' || c == 'C') {
            entries.next();
        }
        if !path.is_empty() {
            paths.push(path.to_string());
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn porcelain_modified_and_untracked() {
        assert_eq!(
            parse_porcelain_z(" M src/lib.rs\0?? notes.txt\0"),
            ["src/lib.rs", "notes.txt"]
        );
    }

    #[test]
    fn porcelain_rename_reports_new_path() {
        assert_eq!(
            parse_porcelain_z("R  new/name.py\0old/name.py\0 M setup.py\0"),
            ["new/name.py", "setup.py"]
        );
    }

    #[test]
    fn porcelain_paths_are_not_quoted() {
        assert_eq!(
            parse_porcelain_z("?? with space.txt\0?? caf\u{e9}.txt\0"),
            ["with space.txt", "caf\u{e9}.txt"]
        );
    }

    #[test]
    fn porcelain_empty_and_short_entries_are_ignored() {
        assert!(parse_porcelain_z("").is_empty());
        assert!(parse_porcelain_z("M\0").is_empty());
    }
}
