//! Stage, commit and push the regenerated site.

use std::path::Path;

use git2::{
    Cred, CredentialType, ErrorCode, IndexAddOption, PushOptions, RemoteCallbacks, Repository,
    Signature,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PublishError;

/// Commit message used when none is configured.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Auto-update inventory";

/// Give up after this many rejected credential attempts.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// How the site is committed and pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitOptions {
    /// Push after committing.
    pub push: bool,
    /// Remote to push to.
    pub remote: String,
    /// Commit message.
    pub message: String,
}

impl Default for GitOptions {
    fn default() -> Self {
        Self {
            push: true,
            remote: "origin".to_string(),
            message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }
}

/// What [`publish`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The working tree matched `HEAD` after staging.
    NothingToCommit,
    /// A commit was created but not pushed.
    Committed { commit_id: String, branch: String },
    /// A commit was created and pushed.
    Pushed {
        commit_id: String,
        remote: String,
        branch: String,
    },
}

impl PublishOutcome {
    /// Id of the new commit, if one was made.
    pub fn commit_id(&self) -> Option<&str> {
        match self {
            PublishOutcome::NothingToCommit => None,
            PublishOutcome::Committed { commit_id, .. }
            | PublishOutcome::Pushed { commit_id, .. } => Some(commit_id),
        }
    }
}

/// Stage everything under `work_dir`, commit it, and optionally push.
///
/// Only paths below `work_dir` are staged when it is a subdirectory of the
/// repository. Ignored files stay ignored; deletions are staged too.
pub fn publish(work_dir: &Path, options: &GitOptions) -> Result<PublishOutcome, PublishError> {
    let repo = Repository::discover(work_dir)?;
    let pathspec = pathspec_for(&repo, work_dir);
    debug!(pathspec = %pathspec, "staging changes");

    let mut index = repo.index()?;
    index.add_all([pathspec.as_str()], IndexAddOption::DEFAULT, None)?;
    index.update_all([pathspec.as_str()], None)?;
    index.write()?;
    let tree_id = index.write_tree()?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
        Err(e) => return Err(e.into()),
    };

    let unchanged = match &parent {
        Some(parent) => parent.tree_id() == tree_id,
        None => index.is_empty(),
    };
    if unchanged {
        info!("no changes to commit");
        return Ok(PublishOutcome::NothingToCommit);
    }

    let signature = repo
        .signature()
        .or_else(|_| Signature::now("stockroom", "stockroom@localhost"))?;
    let tree = repo.find_tree(tree_id)?;
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    let commit_id = repo
        .commit(
            Some("HEAD"),
            &signature,
            &signature,
            &options.message,
            &tree,
            &parents,
        )?
        .to_string();

    let branch = current_branch(&repo)?;
    info!(commit = %commit_id, branch = %branch, "committed");

    if !options.push {
        return Ok(PublishOutcome::Committed { commit_id, branch });
    }

    push_branch(&repo, &options.remote, &branch)?;
    info!(remote = %options.remote, branch = %branch, "pushed");
    Ok(PublishOutcome::Pushed {
        commit_id,
        remote: options.remote.clone(),
        branch,
    })
}

/// Pathspec selecting `work_dir` inside the repository.
fn pathspec_for(repo: &Repository, work_dir: &Path) -> String {
    let rel = repo.workdir().and_then(|root| {
        let root = root.canonicalize().ok()?;
        let dir = work_dir.canonicalize().ok()?;
        dir.strip_prefix(&root).ok().map(Path::to_path_buf)
    });

    match rel {
        Some(rel) if !rel.as_os_str().is_empty() => {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            parts.join("/")
        }
        _ => "*".to_string(),
    }
}

fn current_branch(repo: &Repository) -> Result<String, PublishError> {
    let head = repo.head()?;
    if !head.is_branch() {
        return Err(PublishError::DetachedHead);
    }
    head.shorthand()
        .map(str::to_string)
        .ok_or(PublishError::DetachedHead)
}

fn push_branch(repo: &Repository, remote_name: &str, branch: &str) -> Result<(), PublishError> {
    let mut remote = repo.find_remote(remote_name)?;
    let config = repo.config()?;
    let mut attempts = 0;

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            if let Some(user) = username {
                return Cred::ssh_key_from_agent(user);
            }
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            return Cred::credential_helper(&config, url, username);
        }
        Cred::default()
    });
    callbacks.push_update_reference(|refname, status| match status {
        Some(message) => Err(git2::Error::from_str(&format!(
            "remote rejected {refname}: {message}"
        ))),
        None => Ok(()),
    });

    let mut push_options = PushOptions::new();
    push_options.remote_callbacks(callbacks);

    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    remote.push(&[refspec.as_str()], Some(&mut push_options))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = GitOptions::default();
        assert!(options.push);
        assert_eq!(options.remote, "origin");
        assert_eq!(options.message, DEFAULT_COMMIT_MESSAGE);
    }

    #[test]
    fn test_outcome_commit_id() {
        assert_eq!(PublishOutcome::NothingToCommit.commit_id(), None);
        let outcome = PublishOutcome::Committed {
            commit_id: "abc".into(),
            branch: "main".into(),
        };
        assert_eq!(outcome.commit_id(), Some("abc"));
    }
}
