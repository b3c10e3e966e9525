pub mod blob;
pub mod diff;
pub mod history;
pub mod repository;
pub mod resolve;

pub use repository::{RepositoryHandle, RepositoryManager, SharedRepositories};
