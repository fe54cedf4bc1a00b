//! Integration tests for the `git` mirror client.
//!
//! All repositories are local (`file://` URLs); tests skip gracefully when
//! `git` is not installed.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use gitmigrate_core::errors::GitError;
use gitmigrate_core::git::GitMirror;

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn run_git(args: &[&str], dir: Option<&Path>) {
    let mut cmd = std::process::Command::new("git");
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    let status = cmd
        .args(args)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {:?} failed", args);
}

/// Seed a bare repository with one commit, a second branch, and a tag.
fn seed_source(dir: &Path) -> String {
    let work = dir.join("seed-work");
    fs::create_dir_all(&work).unwrap();
    run_git(&["init", work.to_str().unwrap()], None);
    run_git(&["config", "user.email", "test@example.com"], Some(&work));
    run_git(&["config", "user.name", "Test"], Some(&work));
    fs::write(work.join("file.txt"), "contents\n").unwrap();
    run_git(&["add", "."], Some(&work));
    run_git(&["commit", "-m", "initial commit"], Some(&work));
    run_git(&["branch", "develop"], Some(&work));
    run_git(&["tag", "v0.1"], Some(&work));

    let bare = dir.join("source.git");
    run_git(&["init", "--bare", bare.to_str().unwrap()], None);
    let url = format!("file://{}", bare.display());
    run_git(&["push", "--mirror", &url], Some(&work));
    url
}

fn list_refs(url: &str) -> Vec<String> {
    let output = std::process::Command::new("git")
        .args(["ls-remote", url])
        .output()
        .expect("failed to run git ls-remote");
    assert!(output.status.success());
    let mut refs: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|l| l.split_whitespace().nth(1).map(str::to_string))
        .filter(|r| r != "HEAD")
        .collect();
    refs.sort();
    refs
}

#[tokio::test]
async fn clone_relocate_push_roundtrip() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }

    let tmp = TempDir::new().unwrap();
    let source_url = seed_source(tmp.path());

    let dest = tmp.path().join("dest.git");
    run_git(&["init", "--bare", dest.to_str().unwrap()], None);
    let dest_url = format!("file://{}", dest.display());

    let git = GitMirror::new();
    let local = tmp.path().join("mirror.git");

    git.mirror_clone(&source_url, &local).await.expect("clone failed");
    git.set_push_url(&local, &dest_url).await.expect("set-url failed");
    git.push_mirror(&local).await.expect("push failed");

    assert_eq!(list_refs(&dest_url), list_refs(&source_url));
}

#[tokio::test]
async fn clone_of_missing_repository_reports_command_failure() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }

    let tmp = TempDir::new().unwrap();
    let url = format!("file://{}/does-not-exist.git", tmp.path().display());
    let local = tmp.path().join("mirror.git");

    let git = GitMirror::new();
    let err = git
        .mirror_clone(&url, &local)
        .await
        .expect_err("clone should fail");
    match err {
        GitError::CommandFailed { exit_code, .. } => assert_ne!(exit_code, 0),
        other => panic!("unexpected error: {other:?}"),
    }
}
