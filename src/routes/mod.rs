//! API route handlers - maps HTTP endpoints to git query operations.
//!
//! Each submodule defines routes for a feature area:
//! - `commits`: History listing with merge filtering and a page ceiling
//! - `diff`: Unified diff of a single-parent commit against its parent
//! - `blobs`: Blob existence checks and base64 content retrieval

pub mod blobs;
pub mod commits;
pub mod diff;

use axum::Router;

use crate::git::SharedRepositories;

pub fn create_router(repositories: SharedRepositories) -> Router {
    Router::new()
        .merge(commits::routes(repositories.clone()))
        .merge(diff::routes(repositories.clone()))
        .merge(blobs::routes(repositories))
}
