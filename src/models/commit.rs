use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSummary {
    pub message: String,
    pub revision: String,
    pub author: String,
    pub parents: Vec<String>,
    /// Authored timestamp in the author's recorded UTC offset.
    pub time: DateTime<FixedOffset>,
}
