mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use arthur_ops::defaults::Defaults;
use arthur_ops::command::SystemRunner;
use arthur_ops::release;

use common::ScriptedRunner;

const COMMIT: &str = "8f2c1d0e9b7a6f5e4d3c2b1a0f9e8d7c6b5a4f3e";
const DATE: &str = "2021-06-01T12:34:56-07:00";

fn checkout() -> (TempDir, PathBuf) {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("python/etl/config")).unwrap();
    let top = root.path().to_path_buf();
    (root, top)
}

fn git(top: &Path, porcelain: &str) -> ScriptedRunner {
    ScriptedRunner::new()
        .ok("git rev-parse --show-toplevel", &format!("{}\n", top.display()))
        .ok("git rev-parse --abbrev-ref HEAD", "master\n")
        .ok("git rev-parse HEAD", &format!("{}\n", COMMIT))
        .ok("git log -1 --format=%cI", &format!("{}\n", DATE))
        .fail("git describe --tags --exact-match HEAD", 128, "fatal: no tag exactly matches")
        .ok("git status --porcelain -z --untracked-files=all", porcelain)
}

#[test]
fn writes_marker_for_clean_checkout() {
    let (_root, top) = checkout();
    let runner = git(&top, "");

    let output = release::update(&top, None, &Defaults::default(), &runner).unwrap();

    assert!(output.updated);
    let content = fs::read_to_string(top.join("python/etl/config/release.txt")).unwrap();
    assert_eq!(
        content,
        format!(
            "toplevel={}\ncommit={} (branch: master)\ndate={}\n",
            top.display(),
            COMMIT,
            DATE
        )
    );
}

#[test]
fn dirty_checkout_adds_warning_line() {
    let (_root, top) = checkout();
    let runner = git(&top, " M python/etl/extract.py\0");

    let output = release::update(&top, None, &Defaults::default(), &runner).unwrap();

    assert_eq!(
        output.lines.last().map(String::as_str),
        Some("warning=working tree contains uncommitted changes")
    );
}

#[test]
fn release_file_itself_does_not_count_as_dirty() {
    let (_root, top) = checkout();
    let runner = git(&top, " M python/etl/config/release.txt\0");

    let output = release::update(&top, None, &Defaults::default(), &runner).unwrap();

    assert!(!output.info.dirty);
    assert!(output.lines.iter().all(|line| !line.starts_with("warning=")));
}

#[test]
fn second_run_leaves_file_untouched() {
    let (_root, top) = checkout();
    let path = top.join("python/etl/config/release.txt");

    let first = release::update(&top, None, &Defaults::default(), &git(&top, "")).unwrap();
    assert!(first.updated);
    let before = fs::metadata(&path).unwrap().modified().unwrap();
    let content = fs::read_to_string(&path).unwrap();

    // After the first write git reports the marker as modified.
    let runner = git(&top, " M python/etl/config/release.txt\0");
    let second = release::update(&top, None, &Defaults::default(), &runner).unwrap();

    assert!(!second.updated);
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
}

#[test]
fn file_override_is_relative_to_toplevel() {
    let (_root, top) = checkout();
    let runner = git(&top, "?? RELEASE\0");

    let output = release::update(&top, Some("RELEASE"), &Defaults::default(), &runner).unwrap();

    assert_eq!(PathBuf::from(&output.path), top.join("RELEASE"));
    assert!(!output.info.dirty);
    assert!(top.join("RELEASE").is_file());
}

#[test]
fn outside_a_checkout_is_a_git_error() {
    let (_root, top) = checkout();
    let runner = ScriptedRunner::new().fail(
        "git rev-parse --show-toplevel",
        128,
        "fatal: not a git repository",
    );

    let err = release::update(&top, None, &Defaults::default(), &runner).unwrap_err();

    assert_eq!(err.code.as_str(), "git.command_failed");
    assert!(err.message.contains("not a git repository"));
    assert!(!top.join("python/etl/config/release.txt").exists());
}

fn real_git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(["-c", "user.name=Release Test", "-c", "user.email=release@example.com"])
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {:?} failed", args);
}

/// Repository with one commit and an untracked, empty marker directory.
fn real_checkout() -> TempDir {
    let root = TempDir::new().unwrap();
    real_git(root.path(), &["init", "--quiet"]);
    fs::write(root.path().join("setup.py"), "from setuptools import setup\n").unwrap();
    real_git(root.path(), &["add", "setup.py"]);
    real_git(root.path(), &["commit", "--quiet", "-m", "initial"]);
    fs::create_dir_all(root.path().join("python/etl/config")).unwrap();
    root
}

#[test]
fn marker_in_untracked_directory_is_stable_across_runs() {
    let root = real_checkout();
    let defaults = Defaults::default();

    let first = release::update(root.path(), None, &defaults, &SystemRunner).unwrap();
    assert!(first.updated);
    assert!(!first.info.dirty);
    let path = PathBuf::from(&first.path);
    let content = fs::read_to_string(&path).unwrap();
    let before = fs::metadata(&path).unwrap().modified().unwrap();

    let second = release::update(root.path(), None, &defaults, &SystemRunner).unwrap();

    assert!(!second.updated);
    assert!(!second.info.dirty);
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
}

#[test]
fn untracked_file_beside_the_marker_is_dirty() {
    let root = real_checkout();
    fs::write(root.path().join("python/etl/config/notes.txt"), "scratch\n").unwrap();

    let output = release::update(root.path(), None, &Defaults::default(), &SystemRunner).unwrap();

    assert!(output.info.dirty);
}

#[test]
fn marker_path_with_space_and_accent_is_ignored() {
    let root = real_checkout();
    let file = "python/etl/config/r\u{e9}lease notes.txt";

    let first = release::update(root.path(), Some(file), &Defaults::default(), &SystemRunner).unwrap();
    let second = release::update(root.path(), Some(file), &Defaults::default(), &SystemRunner).unwrap();

    assert!(first.updated);
    assert!(!second.info.dirty);
    assert!(!second.updated);
}
