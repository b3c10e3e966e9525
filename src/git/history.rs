use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{Commit, Oid, Repository, Sort};

use crate::error::Result;
use crate::git::repository::RepositoryHandle;
use crate::git::resolve::{self, ObjectKind};
use crate::models::CommitSummary;

/// Hard ceiling on the number of commits returned per walk, regardless of
/// the caller-requested limit.
pub const MAX_COMMITS_PER_PAGE: usize = 30;

/// Predicate applied to each commit encountered during a history walk.
pub trait CommitFilter {
    fn admit(&mut self, commit: &Commit<'_>) -> bool;
}

/// Admits only commits with exactly one parent; roots and merges are skipped.
pub struct ExcludeMerges;

impl CommitFilter for ExcludeMerges {
    fn admit(&mut self, commit: &Commit<'_>) -> bool {
        commit.parent_count() == 1
    }
}

/// Admits at most the configured number of commits.
pub struct LimitCount {
    remaining: usize,
}

impl LimitCount {
    pub fn new(limit: usize) -> Self {
        Self { remaining: limit }
    }
}

impl CommitFilter for LimitCount {
    fn admit(&mut self, _commit: &Commit<'_>) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Admits a commit only when both filters admit it. The second filter is not
/// consulted when the first rejects, so a rejected commit consumes no count.
pub struct And<A, B>(pub A, pub B);

impl<A: CommitFilter, B: CommitFilter> CommitFilter for And<A, B> {
    fn admit(&mut self, commit: &Commit<'_>) -> bool {
        self.0.admit(commit) && self.1.admit(commit)
    }
}

/// Walk history from `start` in reverse-chronological order and summarize
/// each admitted commit.
///
/// The walk ends as soon as `max_count` commits have been admitted, clamped
/// to [`MAX_COMMITS_PER_PAGE`]. With `exclude_merges` set, commits without
/// exactly one parent are skipped and do not count against the limit.
pub fn walk(
    handle: &RepositoryHandle,
    start: &str,
    exclude_merges: bool,
    max_count: usize,
) -> Result<Vec<CommitSummary>> {
    let start_id = resolve::resolve(handle, start, ObjectKind::Commit)?;
    let max_count = max_count.min(MAX_COMMITS_PER_PAGE);

    let mut filter: Box<dyn CommitFilter> = if exclude_merges {
        Box::new(And(ExcludeMerges, LimitCount::new(max_count)))
    } else {
        Box::new(LimitCount::new(max_count))
    };

    collect(handle.repo(), start_id, filter.as_mut(), max_count)
        .map_err(|e| handle.unavailable("error walking commit history", e))
}

fn collect(
    repo: &Repository,
    start: Oid,
    filter: &mut dyn CommitFilter,
    max_count: usize,
) -> std::result::Result<Vec<CommitSummary>, git2::Error> {
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;
    revwalk.push(start)?;

    let mut commits = Vec::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        if filter.admit(&commit) {
            commits.push(summarize(&commit));
        }
        if commits.len() >= max_count {
            break;
        }
    }

    Ok(commits)
}

fn summarize(commit: &Commit<'_>) -> CommitSummary {
    let author = commit.author();
    CommitSummary {
        message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        revision: commit.id().to_string(),
        author: String::from_utf8_lossy(author.name_bytes()).into_owned(),
        parents: commit.parent_ids().map(|id| id.to_string()).collect(),
        time: authored_at(author.when()),
    }
}

/// Express a commit timestamp in the UTC offset recorded by its author.
fn authored_at(when: git2::Time) -> DateTime<FixedOffset> {
    let offset =
        FixedOffset::east_opt(when.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    match DateTime::from_timestamp(when.seconds(), 0) {
        Some(instant) => instant.with_timezone(&offset),
        None => DateTime::UNIX_EPOCH.with_timezone(&offset),
    }
}
