//! Navigation error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Offset {offset} is outside the history list ({count} entries)")]
    OffsetOutOfRange { offset: i32, count: usize },

    #[error("Entry index {0} does not exist")]
    InvalidIndex(usize),

    #[error("No committed entry")]
    NoCommittedEntry,
}
