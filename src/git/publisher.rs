//! Commit and push of a workspace's staged change set
//!
//! An empty change set is reported as [`PublishOutcome::NoOp`] and never
//! produces a commit. A rejected push (non-fast-forward from a concurrent
//! writer, revoked token) fails the whole operation; there is no rebase and
//! no retry.

use git2::{Commit, ErrorCode, Oid, PushOptions, Repository, Signature};
use tracing::{info, instrument};

use crate::error::{Error, Result};

use super::Workspace;

pub const BOT_NAME: &str = "Argo Deployer";
pub const BOT_EMAIL: &str = "argo-deployer@bot.local";

const REMOTE_NAME: &str = "origin";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A commit was created and pushed upstream
    Pushed { commit: Oid },
    /// The staged tree matches HEAD; nothing was committed
    NoOp,
}

fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_commit()?)),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Branch HEAD points at, e.g. `refs/heads/main`
fn head_branch(repo: &Repository) -> Result<String> {
    let head = repo.find_reference("HEAD")?;
    head.symbolic_target()
        .map(str::to_string)
        .ok_or_else(|| Error::GitError("HEAD is detached; cannot determine branch".to_string()))
}

/// Commit the staged change set with the bot identity and push it
#[instrument(skip(workspace))]
pub fn publish(workspace: &Workspace, message: &str) -> Result<PublishOutcome> {
    let repo = workspace.repo();
    let mut index = repo.index()?;
    let tree_id = index.write_tree()?;
    let parent = head_commit(repo)?;

    let unchanged = match &parent {
        Some(commit) => commit.tree_id() == tree_id,
        None => index.is_empty(),
    };
    if unchanged {
        info!("Change set is empty, skipping commit");
        return Ok(PublishOutcome::NoOp);
    }

    let signature = Signature::now(BOT_NAME, BOT_EMAIL)?;
    let tree = repo.find_tree(tree_id)?;
    let parents: Vec<&Commit<'_>> = parent.iter().collect();
    let commit = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;

    let branch = head_branch(repo)?;
    push(workspace, &branch)?;

    info!("Pushed commit {} to {}", commit, branch);
    Ok(PublishOutcome::Pushed { commit })
}

fn push(workspace: &Workspace, branch: &str) -> Result<()> {
    let mut remote = workspace.repo().find_remote(REMOTE_NAME)?;

    let mut callbacks = workspace.credentials().remote_callbacks();
    callbacks.push_update_reference(|refname, status| match status {
        Some(reason) => Err(git2::Error::from_str(&format!(
            "push of {refname} rejected: {reason}"
        ))),
        None => Ok(()),
    });

    let mut options = PushOptions::new();
    options.remote_callbacks(callbacks);

    let refspec = format!("{branch}:{branch}");
    remote.push(&[refspec.as_str()], Some(&mut options))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_support::{
        bare_remote, commit_count, config_for, empty_remote, exists_at_head, head_author,
        head_message,
    };

    #[test]
    fn clean_workspace_is_a_noop() {
        let remote = bare_remote();
        let workspace = Workspace::acquire(&config_for(&remote)).unwrap();
        assert_eq!(publish(&workspace, "nothing").unwrap(), PublishOutcome::NoOp);
        assert_eq!(commit_count(&remote), 1);
    }

    #[test]
    fn staged_change_is_committed_and_pushed() {
        let remote = bare_remote();
        let workspace = Workspace::acquire(&config_for(&remote)).unwrap();
        workspace.write_file("apps/demo.yaml", "kind: Demo\n").unwrap();
        workspace.stage_paths(&["apps/demo.yaml"]).unwrap();

        let outcome = publish(&workspace, "Add demo").unwrap();
        assert!(matches!(outcome, PublishOutcome::Pushed { .. }));
        assert_eq!(commit_count(&remote), 2);
        assert_eq!(head_message(&remote), "Add demo");
        assert_eq!(
            head_author(&remote),
            (BOT_NAME.to_string(), BOT_EMAIL.to_string())
        );
        assert!(exists_at_head(&remote, "apps/demo.yaml"));
    }

    #[test]
    fn unstaged_files_do_not_count_as_changes() {
        let remote = bare_remote();
        let workspace = Workspace::acquire(&config_for(&remote)).unwrap();
        workspace.write_file("stray.txt", "x").unwrap();
        assert_eq!(publish(&workspace, "stray").unwrap(), PublishOutcome::NoOp);
    }

    #[test]
    fn first_commit_on_empty_remote() {
        let remote = empty_remote();
        let workspace = Workspace::acquire(&config_for(&remote)).unwrap();
        assert_eq!(publish(&workspace, "empty").unwrap(), PublishOutcome::NoOp);

        workspace.write_file("apps/demo.yaml", "kind: Demo\n").unwrap();
        workspace.stage_paths(&["apps/demo.yaml"]).unwrap();
        assert!(matches!(
            publish(&workspace, "Add demo").unwrap(),
            PublishOutcome::Pushed { .. }
        ));
        assert_eq!(commit_count(&remote), 1);
    }

    #[test]
    fn losing_a_push_race_fails_loudly() {
        let remote = bare_remote();
        let config = config_for(&remote);
        let first = Workspace::acquire(&config).unwrap();
        let second = Workspace::acquire(&config).unwrap();

        first.write_file("a.yaml", "a").unwrap();
        first.stage_paths(&["a.yaml"]).unwrap();
        publish(&first, "first writer").unwrap();

        second.write_file("b.yaml", "b").unwrap();
        second.stage_paths(&["b.yaml"]).unwrap();
        let err = publish(&second, "second writer").unwrap_err();
        assert!(matches!(err, Error::GitError(_)), "got {err:?}");

        assert_eq!(head_message(&remote), "first writer");
        assert_eq!(commit_count(&remote), 2);
    }
}
