use git2::{Commit, DiffFormat, DiffOptions, Repository};

use crate::error::{AppError, Result};
use crate::git::repository::RepositoryHandle;

/// Unified-diff text for a single commit against its parent.
#[derive(Debug)]
pub struct DiffPatch {
    bytes: Vec<u8>,
}

impl DiffPatch {
    pub fn content_type(&self) -> &'static str {
        "text/x-patch"
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Compute the tree diff between `commit` and its sole parent.
///
/// Root commits and merge commits are rejected before any object is read:
/// a diff against "no parent" or "multiple parents" is not well-defined here.
pub fn commit_diff(handle: &RepositoryHandle, commit: &Commit<'_>) -> Result<DiffPatch> {
    match commit.parent_count() {
        1 => {}
        0 => {
            return Err(AppError::InvalidArgument(
                "cannot retrieve the diff of a commit with 0 parents".to_string(),
            ));
        }
        _ => {
            return Err(AppError::InvalidArgument(
                "cannot retrieve the diff of a commit with multiple parents".to_string(),
            ));
        }
    }

    format_patch(handle.repo(), commit)
        .map_err(|e| handle.unavailable("error computing commit diff", e))
}

fn format_patch(
    repo: &Repository,
    commit: &Commit<'_>,
) -> std::result::Result<DiffPatch, git2::Error> {
    let parent_tree = commit.parent(0)?.tree()?;
    let commit_tree = commit.tree()?;

    let mut opts = DiffOptions::new();
    opts.context_lines(3);

    let diff = repo.diff_tree_to_tree(Some(&parent_tree), Some(&commit_tree), Some(&mut opts))?;

    let mut bytes = Vec::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        // Content lines carry their origin marker; headers already do.
        match line.origin() {
            '+' | '-' | ' ' => bytes.push(line.origin() as u8),
            _ => {}
        }
        bytes.extend_from_slice(line.content());
        true
    })?;

    Ok(DiffPatch { bytes })
}
