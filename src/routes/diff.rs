use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::error::Result;
use crate::git::resolve::{self, ObjectKind};
use crate::git::{diff, SharedRepositories};

pub fn routes(repositories: SharedRepositories) -> Router {
    Router::new()
        .route("/projects/{project}/commits/{commit}/diff", get(commit_diff))
        .with_state(repositories)
}

async fn commit_diff(
    State(repositories): State<SharedRepositories>,
    Path((project, commit)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let handle = repositories.open(&project)?;
    let id = resolve::resolve(&handle, &commit, ObjectKind::Commit)?;
    let commit = handle
        .repo()
        .find_commit(id)
        .map_err(|e| handle.unavailable("error loading resolved commit", e))?;

    let patch = diff::commit_diff(&handle, &commit)?;
    Ok((
        [(header::CONTENT_TYPE, patch.content_type())],
        patch.into_bytes(),
    ))
}
