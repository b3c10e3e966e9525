//! HTTP surface tests: routing, status codes, headers and response shapes,
//! exercised through the router with in-memory requests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use git2::{Oid, Repository, Signature, Time};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use git_query::git::blob::MAX_BUFFERED_SIZE;
use git_query::git::RepositoryManager;
use git_query::routes;

struct TestServer {
    _storage: TempDir,
    router: Router,
    /// `bootstrap <- first <- second <- third` on `master`, plus a `side`
    /// commit off `first` and a `merge` of both on `merged`.
    commits: Vec<Oid>,
    blob: Oid,
    blob_data: &'static [u8],
}

fn commit(repo: &Repository, content: &str, message: &str, seconds: i64, parents: &[Oid]) -> Oid {
    let sig = Signature::new("Rev Walker", "rev@example.com", &Time::new(seconds, 60)).unwrap();
    let blob = repo.blob(content.as_bytes()).unwrap();
    let mut builder = repo.treebuilder(None).unwrap();
    builder.insert("notes.txt", blob, 0o100644).unwrap();
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();

    let parents: Vec<git2::Commit> = parents
        .iter()
        .map(|id| repo.find_commit(*id).unwrap())
        .collect();
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(None, &sig, &sig, message, &tree, &parent_refs).unwrap()
}

fn server() -> TestServer {
    let storage = TempDir::new().unwrap();
    let repo = Repository::init_bare(storage.path().join("demo.git")).unwrap();

    let bootstrap = commit(&repo, "zero\n", "bootstrap", 1_000, &[]);
    let first = commit(&repo, "one\n", "first change", 2_000, &[bootstrap]);
    let second = commit(&repo, "two\n", "second change", 3_000, &[first]);
    let third = commit(&repo, "three\n", "third change", 4_000, &[second]);
    let side = commit(&repo, "aside\n", "side change", 5_000, &[first]);
    let merge = commit(&repo, "joined\n", "join histories", 6_000, &[third, side]);

    repo.reference("refs/heads/master", third, true, "fixture").unwrap();
    repo.reference("refs/heads/merged", merge, true, "fixture").unwrap();

    let blob_data: &'static [u8] = b"raw blob payload \x00\x01\x02\n";
    let blob = repo.blob(blob_data).unwrap();

    let router = routes::create_router(Arc::new(RepositoryManager::new(storage.path())));

    TestServer {
        _storage: storage,
        router,
        commits: vec![bootstrap, first, second, third, side, merge],
        blob,
        blob_data,
    }
}

async fn get(server: &TestServer, uri: &str) -> Response {
    server
        .router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn read_json(response: Response) -> Value {
    serde_json::from_slice(&read_body(response).await).unwrap()
}

#[tokio::test]
async fn commits_listing_defaults_to_master_head() {
    let server = server();
    let response = get(&server, "/projects/demo/commits").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let commits = body.as_array().unwrap();

    assert_eq!(commits.len(), 3);
    assert_eq!(commits[0]["message"], "third change");
    assert_eq!(commits[1]["message"], "second change");
    assert_eq!(commits[2]["message"], "first change");

    assert_eq!(commits[0]["revision"], server.commits[3].to_string());
    assert_eq!(commits[0]["author"], "Rev Walker");
    assert_eq!(
        commits[0]["parents"],
        serde_json::json!([server.commits[2].to_string()])
    );

    // ISO-8601 with the author's recorded offset.
    let time = commits[0]["time"].as_str().unwrap();
    assert!(time.ends_with("+01:00"), "unexpected time format: {time}");
    chrono::DateTime::parse_from_rfc3339(time).unwrap();
}

#[tokio::test]
async fn commits_listing_honors_start_and_limit() {
    let server = server();
    let uri = format!(
        "/projects/demo/commits?start={}&limit=1",
        server.commits[2]
    );
    let response = get(&server, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let commits = body.as_array().unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0]["message"], "second change");
}

#[tokio::test]
async fn commits_listing_clamps_the_limit() {
    let storage = TempDir::new().unwrap();
    let repo = Repository::init_bare(storage.path().join("long.git")).unwrap();

    let mut tip = commit(&repo, "0", "c0", 1_000, &[]);
    for i in 1..40 {
        tip = commit(&repo, &i.to_string(), &format!("c{i}"), 1_000 + i, &[tip]);
    }
    repo.reference("refs/heads/master", tip, true, "fixture").unwrap();

    let router = routes::create_router(Arc::new(RepositoryManager::new(storage.path())));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/projects/long/commits?limit=500")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(body.as_array().unwrap().len(), 30);
}

#[tokio::test]
async fn commits_listing_excludes_merges() {
    let server = server();
    let response = get(&server, "/projects/demo/commits?start=merged").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    for summary in body.as_array().unwrap() {
        assert_ne!(summary["message"], "join histories");
        assert_eq!(summary["parents"].as_array().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn unknown_start_and_unknown_project_are_404() {
    let server = server();

    let response = get(&server, "/projects/demo/commits?start=release-1.0").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(read_json(response).await["error"].is_string());

    let response = get(&server, "/projects/ghost/commits").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn storage_failures_surface_as_503() {
    let storage = TempDir::new().unwrap();
    let repo = Repository::init_bare(storage.path().join("demo.git")).unwrap();

    let base = commit(&repo, "0", "base", 1_000, &[]);
    let tip = commit(&repo, "1", "tip", 2_000, &[base]);
    repo.reference("refs/heads/master", tip, true, "fixture").unwrap();

    // Strip the parent's loose object so the walk fails partway through.
    let hex = base.to_string();
    std::fs::remove_file(
        storage
            .path()
            .join("demo.git")
            .join("objects")
            .join(&hex[..2])
            .join(&hex[2..]),
    )
    .unwrap();

    let router = routes::create_router(Arc::new(RepositoryManager::new(storage.path())));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/projects/demo/commits")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        read_json(response).await["error"],
        "repository temporarily unavailable"
    );
}

#[tokio::test]
async fn diff_returns_a_patch_with_its_content_type() {
    let server = server();
    let uri = format!("/projects/demo/commits/{}/diff", server.commits[3]);
    let response = get(&server, &uri).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/x-patch");

    let body = String::from_utf8(read_body(response).await).unwrap();
    assert!(body.contains("-two"));
    assert!(body.contains("+three"));
}

#[tokio::test]
async fn diff_of_root_and_merge_commits_is_400() {
    let server = server();

    let uri = format!("/projects/demo/commits/{}/diff", server.commits[0]);
    let response = get(&server, &uri).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = read_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("0 parents"), "unexpected message: {error}");

    let uri = format!("/projects/demo/commits/{}/diff", server.commits[5]);
    let response = get(&server, &uri).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = read_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("multiple parents"), "unexpected message: {error}");
}

#[tokio::test]
async fn diff_of_an_unknown_commit_is_404() {
    let server = server();
    let response = get(&server, "/projects/demo/commits/deadbeef/diff").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blob_listing_is_always_404() {
    let server = server();
    let response = get(&server, "/projects/demo/blobs").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(read_json(response).await["error"].is_string());
}

#[tokio::test]
async fn blob_info_confirms_existence_with_the_full_id() {
    let server = server();

    // An abbreviated id resolves to the full identifier.
    let uri = format!("/projects/demo/blobs/{}", &server.blob.to_string()[..10]);
    let response = get(&server, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["blobId"], server.blob.to_string());
}

#[tokio::test]
async fn blob_info_for_missing_or_non_blob_objects_is_404() {
    let server = server();

    let response = get(&server, "/projects/demo/blobs/deadbeef").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let uri = format!("/projects/demo/blobs/{}", server.commits[0]);
    let response = get(&server, &uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blob_content_is_base64_with_declared_length() {
    let server = server();
    let uri = format!("/projects/demo/blobs/{}/content", server.blob);
    let response = get(&server, &uri).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );

    let declared: usize = response.headers()["x-content-length"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(declared, server.blob_data.len());

    let body = read_body(response).await;
    assert_eq!(STANDARD.decode(&body).unwrap(), server.blob_data);
}

#[tokio::test]
async fn threshold_sized_blob_content_arrives_intact() {
    let storage = TempDir::new().unwrap();
    let repo = Repository::init_bare(storage.path().join("demo.git")).unwrap();

    let data: Vec<u8> = (0..MAX_BUFFERED_SIZE).map(|i| (i % 251) as u8).collect();
    let blob = repo.blob(&data).unwrap();

    let router = routes::create_router(Arc::new(RepositoryManager::new(storage.path())));
    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/projects/demo/blobs/{blob}/content"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let declared: usize = response.headers()["x-content-length"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(declared, data.len());

    // The body crosses the streaming threshold and must still round-trip.
    let body = read_body(response).await;
    assert_eq!(body, STANDARD.encode(&data).into_bytes());
}
