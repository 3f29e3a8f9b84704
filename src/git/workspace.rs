//! Disposable local working copy of the GitOps repository
//!
//! A [`Workspace`] owns a fresh full clone inside a temporary directory. The
//! directory is removed when the workspace is dropped, so every exit path of
//! a deploy or destroy releases it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use git2::build::RepoBuilder;
use git2::{FetchOptions, IndexAddOption, Repository};
use tempfile::TempDir;
use tracing::{debug, info, instrument};

use crate::config::DeployerConfig;
use crate::error::{Error, Result};

use super::GitCredentials;

pub struct Workspace {
    repo: Repository,
    credentials: GitCredentials,
    // Declared last: the repository handle must be closed before the directory goes.
    dir: TempDir,
}

impl Workspace {
    /// Clone the configured repository into a new temporary directory
    #[instrument(skip(config), fields(repo = %config.repo_url))]
    pub fn acquire(config: &DeployerConfig) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("argo-deployer-")
            .tempdir()
            .map_err(|e| Error::SetupError(format!("failed to create temp dir: {e}")))?;

        let credentials = GitCredentials::new(config.git_token.clone());
        let repo = {
            let mut fetch = FetchOptions::new();
            fetch.remote_callbacks(credentials.remote_callbacks());
            RepoBuilder::new()
                .fetch_options(fetch)
                .clone(&config.repo_url, dir.path())?
        };

        info!("Cloned repository into {}", dir.path().display());

        Ok(Self {
            repo,
            credentials,
            dir,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn credentials(&self) -> &GitCredentials {
        &self.credentials
    }

    fn resolve(&self, rel: &str) -> Result<PathBuf> {
        let rel_path = Path::new(rel);
        if !rel_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(Error::SetupError(format!(
                "refusing to touch {rel:?} outside the workspace"
            )));
        }
        Ok(self.root().join(rel_path))
    }

    /// Write `content` to a repository-relative path, creating parent directories
    pub fn write_file(&self, rel: &str, content: &str) -> Result<()> {
        let path = self.resolve(rel)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::SetupError(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&path, content)
            .map_err(|e| Error::SetupError(format!("failed to write {rel}: {e}")))
    }

    /// Delete a file or directory tree; an absent path is not an error
    pub fn remove_path(&self, rel: &str) -> Result<()> {
        let path = self.resolve(rel)?;
        let removed = match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path),
            Ok(_) => fs::remove_file(&path),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} already absent", rel);
                return Ok(());
            }
            Err(e) => Err(e),
        };
        removed.map_err(|e| Error::SetupError(format!("failed to remove {rel}: {e}")))
    }

    /// Stage the given repository-relative files as additions
    pub fn stage_paths(&self, paths: &[&str]) -> Result<()> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(Path::new(path))?;
        }
        index.write()?;
        Ok(())
    }

    /// Stage every addition, modification and deletion under the workspace root
    pub fn stage_all(&self) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;
        Ok(())
    }

    /// Remove the working copy now, reporting any filesystem error
    pub fn release(self) -> Result<()> {
        let Self { repo, dir, .. } = self;
        drop(repo);
        dir.close()
            .map_err(|e| Error::SetupError(format!("failed to remove workspace: {e}")))
    }
}
