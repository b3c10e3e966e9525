use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use git2::Repository;
use tracing::error;

use crate::error::{AppError, Result};

/// Shared, immutable manager handed to every route handler.
pub type SharedRepositories = Arc<RepositoryManager>;

/// Hands out request-scoped repository handles for the projects hosted under
/// a storage root directory.
///
/// The manager itself is immutable configuration and is shared across
/// requests; the handles it opens are not. Every handler opens its own
/// [`RepositoryHandle`] and drops it when the request ends.
pub struct RepositoryManager {
    root: PathBuf,
}

impl RepositoryManager {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Open a scoped handle to the named project's repository.
    ///
    /// Looks for `<root>/<project>.git` first (hosted repositories are
    /// conventionally bare), then `<root>/<project>`.
    pub fn open(&self, project: &str) -> Result<RepositoryHandle> {
        if !valid_project_name(project) {
            return Err(AppError::NotFound(format!(
                "project '{}' not found",
                project
            )));
        }

        let candidates = [
            self.root.join(format!("{}.git", project)),
            self.root.join(project),
        ];

        let path = candidates
            .iter()
            .find(|p| p.exists())
            .ok_or_else(|| AppError::NotFound(format!("project '{}' not found", project)))?;

        match Repository::open(path) {
            Ok(repo) => Ok(RepositoryHandle {
                project: project.to_string(),
                repo,
            }),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Err(AppError::NotFound(format!(
                "project '{}' not found",
                project
            ))),
            Err(e) => {
                error!(project, error = %e, "error opening git repository");
                Err(AppError::RepositoryUnavailable)
            }
        }
    }
}

/// Project names address directories directly under the storage root; reject
/// anything that could escape it.
fn valid_project_name(name: &str) -> bool {
    if name.is_empty() || name.ends_with(".git") {
        return false;
    }

    let path = Path::new(name);
    !path.is_absolute()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// An open repository scoped to one request.
///
/// Owns the underlying `git2::Repository`; dropping the handle releases it on
/// every exit path, so no close bookkeeping is needed in the handlers.
pub struct RepositoryHandle {
    project: String,
    repo: Repository,
}

impl RepositoryHandle {
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Direct access to the underlying object store.
    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Record a store I/O failure with project context and surface it as the
    /// generic transient error. The cause stays in the server log.
    pub(crate) fn unavailable(&self, context: &str, e: git2::Error) -> AppError {
        error!(project = %self.project, error = %e, "{context}");
        AppError::RepositoryUnavailable
    }
}

// git2::Repository has no Debug impl; report the project only.
impl fmt::Debug for RepositoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryHandle")
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}
