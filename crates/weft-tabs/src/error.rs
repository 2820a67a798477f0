//! Tab error types

use thiserror::Error;

use weft_navigation::{NavigationError, SiteInstanceId};

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Could not create a content process endpoint for site instance {0}")]
    EndpointCreationFailed(SiteInstanceId),

    #[error("No committed navigation entry")]
    NoCommittedEntry,

    #[error("No pending navigation entry")]
    NoPendingEntry,

    #[error("Cannot create a shortcut without a page icon")]
    ShortcutIconMissing,

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
