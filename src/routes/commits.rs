use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::{history, SharedRepositories};
use crate::models::CommitSummary;

pub fn routes(repositories: SharedRepositories) -> Router {
    Router::new()
        .route("/projects/{project}/commits", get(list_commits))
        .with_state(repositories)
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default = "default_start")]
    start: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_start() -> String {
    "master".to_string()
}

fn default_limit() -> usize {
    history::MAX_COMMITS_PER_PAGE
}

async fn list_commits(
    State(repositories): State<SharedRepositories>,
    Path(project): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<CommitSummary>>> {
    let handle = repositories.open(&project)?;
    let commits = history::walk(&handle, &query.start, true, query.limit)?;
    Ok(Json(commits))
}
