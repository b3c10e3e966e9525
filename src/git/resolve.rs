use std::fmt;

use git2::{ErrorCode, Oid};

use crate::error::{AppError, Result};
use crate::git::repository::RepositoryHandle;

/// The object kind a revision expression is expected to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Commit,
    Blob,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Commit => f.write_str("commit"),
            ObjectKind::Blob => f.write_str("blob"),
        }
    }
}

/// Resolve a revision expression to the id of an object of the expected kind.
///
/// The kind is appended as a peel suffix (`<expr>^{commit}`, `<expr>^{blob}`)
/// so the object store checks the type during resolution instead of after.
/// Missing objects, ambiguous abbreviations and wrong-kind objects all
/// surface as the same `NotFound`: callers cannot tell which condition
/// occurred.
pub fn resolve(handle: &RepositoryHandle, expr: &str, kind: ObjectKind) -> Result<Oid> {
    let spec = format!("{}^{{{}}}", expr, kind);

    match handle.repo().revparse_single(&spec) {
        Ok(object) => Ok(object.id()),
        Err(e) => match e.code() {
            ErrorCode::NotFound
            | ErrorCode::Ambiguous
            | ErrorCode::InvalidSpec
            | ErrorCode::Peel => Err(AppError::NotFound(format!(
                "no {} matching '{}' found in the repository",
                kind, expr
            ))),
            _ => Err(handle.unavailable("error resolving revision in git repository", e)),
        },
    }
}
