use std::io::{self, Write};

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderName, HeaderValue},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{AppError, Result};
use crate::git::{blob, SharedRepositories};
use crate::models::BlobInfo;

/// Declared decoded size of the blob; the body itself is base64.
const CONTENT_LENGTH_HEADER: &str = "x-content-length";

pub fn routes(repositories: SharedRepositories) -> Router {
    Router::new()
        .route("/projects/{project}/blobs", get(list_blobs))
        .route("/projects/{project}/blobs/{blob}", get(blob_info))
        .route("/projects/{project}/blobs/{blob}/content", get(blob_content))
        .with_state(repositories)
}

/// Enumerating blobs is not supported, whatever the repository holds.
async fn list_blobs() -> Result<()> {
    Err(AppError::NotFound(
        "listing blobs is not supported".to_string(),
    ))
}

async fn blob_info(
    State(repositories): State<SharedRepositories>,
    Path((project, blob)): Path<(String, String)>,
) -> Result<Json<BlobInfo>> {
    let handle = repositories.open(&project)?;
    let blob = blob::locate(&handle, &blob)?;
    Ok(Json(BlobInfo {
        blob_id: blob.id().to_string(),
    }))
}

/// Existence and size are settled before the response starts; the body is
/// base64-encoded on the blocking pool and streamed through a bounded
/// channel, never materialized whole.
async fn blob_content(
    State(repositories): State<SharedRepositories>,
    Path((project, blob)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let handle = repositories.open(&project)?;
    let reference = blob::locate(&handle, &blob)?;
    let size = reference.size();

    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(16);
    tokio::task::spawn_blocking(move || {
        let mut sink = ChannelWriter { tx: tx.clone() };
        let transfer = blob::fetch(&handle, &reference)
            .and_then(|content| content.write_to(&mut sink));
        if transfer.is_err() {
            // write_to already logged the cause; an Err item aborts the
            // stream instead of ending it cleanly at a truncated body.
            let _ = tx.blocking_send(Err(io::Error::other("blob transfer aborted")));
        }
    });

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(blob::CONTENT_TYPE),
            ),
            (
                HeaderName::from_static(CONTENT_LENGTH_HEADER),
                HeaderValue::from(size),
            ),
        ],
        Body::from_stream(ReceiverStream::new(rx)),
    ))
}

/// `io::Write` adapter handing encoder output to the response stream.
struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
