//! Data transfer objects (DTOs) for API responses.
//!
//! These structs are serialized to JSON for client consumption.
//! - `commit`: CommitSummary for history listings
//! - `blob`: BlobInfo for blob identity lookups

pub mod blob;
pub mod commit;

pub use blob::*;
pub use commit::*;
