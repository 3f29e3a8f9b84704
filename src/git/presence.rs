//! Lightweight presence check of an application's descriptor at remote HEAD
//!
//! Fetches only the HEAD commit (depth 1 where the transport supports it)
//! into a bare scratch repository, so no working tree is ever checked out.
//! The scratch storage is dropped before returning.

use std::path::Path;

use git2::build::RepoBuilder;
use git2::{ErrorCode, FetchOptions, ObjectType};
use tracing::{debug, instrument};

use crate::app::AppName;
use crate::config::DeployerConfig;
use crate::error::{Error, Result};

use super::GitCredentials;

/// libgit2's local transport rejects shallow fetches.
fn supports_shallow(url: &str) -> bool {
    ["http://", "https://", "ssh://", "git://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
        || url.starts_with("git@")
}

/// Whether `<argocd_app_path>/<name>.yaml` exists in the tree at remote HEAD
///
/// An empty remote (no commits) reports `false`. Clone or read failures are
/// errors, never a silent `false`.
#[instrument(skip(config), fields(app = %name))]
pub fn read_git_presence(config: &DeployerConfig, name: &AppName) -> Result<bool> {
    let scratch = tempfile::Builder::new()
        .prefix("argo-deployer-status-")
        .tempdir()
        .map_err(|e| Error::SetupError(format!("failed to create scratch dir: {e}")))?;

    let credentials = GitCredentials::new(config.git_token.clone());
    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(credentials.remote_callbacks());
    if supports_shallow(&config.repo_url) {
        fetch.depth(1);
    }

    let repo = RepoBuilder::new()
        .bare(true)
        .fetch_options(fetch)
        .clone(&config.repo_url, scratch.path())?;

    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
            debug!("Remote has no commits");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };
    let tree = head.peel_to_tree()?;

    let descriptor = config.descriptor_path(name.as_str());
    let present = match tree.get_path(Path::new(&descriptor)) {
        Ok(entry) => entry.kind() == Some(ObjectType::Blob),
        Err(e) if e.code() == ErrorCode::NotFound => false,
        Err(e) => return Err(e.into()),
    };

    debug!("Descriptor {} present: {}", descriptor, present);
    Ok(present)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_support::{bare_remote, config_for, empty_remote};
    use crate::git::{publish, Workspace};

    fn name(s: &str) -> AppName {
        AppName::parse(s).unwrap()
    }

    #[test]
    fn shallow_only_for_network_transports() {
        assert!(supports_shallow("https://github.com/acme/gitops"));
        assert!(supports_shallow("git@github.com:acme/gitops.git"));
        assert!(!supports_shallow("/srv/git/gitops.git"));
        assert!(!supports_shallow("file:///srv/git/gitops.git"));
    }

    #[test]
    fn absent_descriptor_reports_false() {
        let remote = bare_remote();
        assert!(!read_git_presence(&config_for(&remote), &name("ghost-app")).unwrap());
    }

    #[test]
    fn empty_remote_reports_false() {
        let remote = empty_remote();
        assert!(!read_git_presence(&config_for(&remote), &name("ghost-app")).unwrap());
    }

    #[test]
    fn pushed_descriptor_reports_true() {
        let remote = bare_remote();
        let config = config_for(&remote);
        let workspace = Workspace::acquire(&config).unwrap();
        workspace
            .write_file("argocd-apps/checkout-svc.yaml", "kind: Application\n")
            .unwrap();
        workspace
            .stage_paths(&["argocd-apps/checkout-svc.yaml"])
            .unwrap();
        publish(&workspace, "add descriptor").unwrap();

        assert!(read_git_presence(&config, &name("checkout-svc")).unwrap());
        assert!(!read_git_presence(&config, &name("other-svc")).unwrap());
    }

    #[test]
    fn unreachable_remote_is_an_error() {
        let mut config = config_for(&bare_remote());
        let missing = tempfile::tempdir().unwrap();
        config.repo_url = missing.path().join("gone.git").display().to_string();
        assert!(read_git_presence(&config, &name("checkout-svc")).is_err());
    }
}
