//! Local bare repositories standing in for the GitOps remote in tests.

use std::path::Path;

use git2::{Repository, Signature};
use tempfile::TempDir;

use crate::config::DeployerConfig;

pub(crate) struct TestRemote {
    pub dir: TempDir,
    pub url: String,
}

/// A bare repository holding a single commit with a README
pub(crate) fn bare_remote() -> TestRemote {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init_bare(dir.path()).unwrap();
    {
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let blob = repo.blob(b"# gitops\n").unwrap();
        let mut builder = repo.treebuilder(None).unwrap();
        builder.insert("README.md", blob, 0o100644).unwrap();
        let tree = repo.find_tree(builder.write().unwrap()).unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
            .unwrap();
    }
    let url = dir.path().display().to_string();
    TestRemote { dir, url }
}

/// A bare repository with no commits at all
pub(crate) fn empty_remote() -> TestRemote {
    let dir = tempfile::tempdir().unwrap();
    Repository::init_bare(dir.path()).unwrap();
    let url = dir.path().display().to_string();
    TestRemote { dir, url }
}

pub(crate) fn config_for(remote: &TestRemote) -> DeployerConfig {
    DeployerConfig::new("/nonexistent/kubeconfig", remote.url.clone(), "test-token")
}

pub(crate) fn commit_count(remote: &TestRemote) -> usize {
    let repo = Repository::open_bare(remote.dir.path()).unwrap();
    if repo.head().is_err() {
        return 0;
    }
    let mut walk = repo.revwalk().unwrap();
    walk.push_head().unwrap();
    walk.count()
}

pub(crate) fn head_message(remote: &TestRemote) -> String {
    let repo = Repository::open_bare(remote.dir.path()).unwrap();
    let commit = repo.head().unwrap().peel_to_commit().unwrap();
    commit.message().unwrap_or_default().to_string()
}

pub(crate) fn head_author(remote: &TestRemote) -> (String, String) {
    let repo = Repository::open_bare(remote.dir.path()).unwrap();
    let commit = repo.head().unwrap().peel_to_commit().unwrap();
    let author = commit.author();
    (
        author.name().unwrap_or_default().to_string(),
        author.email().unwrap_or_default().to_string(),
    )
}

pub(crate) fn exists_at_head(remote: &TestRemote, path: &str) -> bool {
    let repo = Repository::open_bare(remote.dir.path()).unwrap();
    let tree = repo.head().unwrap().peel_to_tree().unwrap();
    tree.get_path(Path::new(path)).is_ok()
}
