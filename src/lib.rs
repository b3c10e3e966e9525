//! Read-only query layer over hosted git repositories.
//!
//! Serves commit history, single-commit diffs, and blob content for the
//! repositories under a storage root. The HTTP surface in [`routes`] is a
//! thin dispatch over the query core in [`git`]: every handler opens its
//! own repository handle, runs one bounded query, and drops the handle.

pub mod error;
pub mod git;
pub mod models;
pub mod routes;
