use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::write::EncoderWriter;
use git2::{Odb, Oid, Repository};
use tracing::error;

use crate::error::{AppError, Result};
use crate::git::repository::RepositoryHandle;
use crate::git::resolve::{self, ObjectKind};

/// Blobs smaller than this are buffered whole; anything at or above it is
/// streamed from the object database. Matches the store's own in-memory
/// object cache ceiling.
pub const MAX_BUFFERED_SIZE: usize = 5 << 20;

/// Content type of every blob body; the payload is base64-encoded raw bytes.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// A blob confirmed to exist in a project.
///
/// [`locate`] is the sole constructor, so holding a `BlobReference` proves
/// the object exists and is a blob, with its decoded size already read from
/// the object header; downstream consumers skip re-validation.
#[derive(Debug)]
pub struct BlobReference {
    project: String,
    id: Oid,
    size: usize,
}

impl BlobReference {
    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn id(&self) -> Oid {
        self.id
    }

    /// Decoded size of the blob in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Confirm that `token` names a blob in the opened repository.
pub fn locate(handle: &RepositoryHandle, token: &str) -> Result<BlobReference> {
    let id = resolve::resolve(handle, token, ObjectKind::Blob)?;
    let size = header_size(handle.repo(), id)
        .map_err(|e| handle.unavailable("error reading blob header", e))?;
    Ok(BlobReference {
        project: handle.project().to_string(),
        id,
        size,
    })
}

fn header_size(repo: &Repository, id: Oid) -> std::result::Result<usize, git2::Error> {
    let (size, _) = repo.odb()?.read_header(id)?;
    Ok(size)
}

enum BlobTransfer<'repo> {
    Buffered(Vec<u8>),
    Streamed { odb: Odb<'repo>, id: Oid },
}

/// Blob bytes ready for transfer, base64-encoded on the way out.
///
/// The declared size and content type are fixed before a single body byte
/// is produced, so both transfer strategies look identical to consumers.
pub struct BlobContent<'repo> {
    project: String,
    size: usize,
    transfer: BlobTransfer<'repo>,
}

impl BlobContent<'_> {
    /// Decoded size of the blob in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    /// Base64-encode the blob into `sink`, buffered or streamed according
    /// to the strategy chosen at open time.
    pub fn write_to(self, sink: &mut dyn io::Write) -> Result<()> {
        let BlobContent { project, transfer, .. } = self;
        encode(transfer, sink).map_err(|e| {
            error!(project = %project, error = %e, "error writing blob content");
            AppError::RepositoryUnavailable
        })
    }
}

fn encode(transfer: BlobTransfer<'_>, sink: &mut dyn io::Write) -> io::Result<()> {
    let mut encoder = EncoderWriter::new(sink, &STANDARD);
    match transfer {
        BlobTransfer::Buffered(bytes) => encoder.write_all(&bytes)?,
        BlobTransfer::Streamed { odb, id } => {
            let (mut reader, _, _) = odb.reader(id).map_err(io::Error::other)?;
            io::copy(&mut reader, &mut encoder)?;
        }
    }
    encoder.finish()?;
    Ok(())
}

/// Open a located blob and pick the transfer strategy for its size.
pub fn fetch<'repo>(
    handle: &'repo RepositoryHandle,
    blob: &BlobReference,
) -> Result<BlobContent<'repo>> {
    open_content(handle, blob)
        .map_err(|e| handle.unavailable("error opening blob content", e))
}

fn open_content<'repo>(
    handle: &'repo RepositoryHandle,
    blob: &BlobReference,
) -> std::result::Result<BlobContent<'repo>, git2::Error> {
    let odb = handle.repo().odb()?;

    let transfer = if blob.size < MAX_BUFFERED_SIZE {
        BlobTransfer::Buffered(odb.read(blob.id)?.data().to_vec())
    } else {
        BlobTransfer::Streamed { odb, id: blob.id }
    };

    Ok(BlobContent {
        project: handle.project().to_string(),
        size: blob.size,
        transfer,
    })
}
