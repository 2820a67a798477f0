//! Core error types

use thiserror::Error;

use weft_services::TabId;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] weft_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] weft_tabs::TabError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] weft_navigation::NavigationError),

    #[error("Preference error: {0}")]
    Service(#[from] weft_services::ServiceError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tab not found: {0}")]
    TabNotFound(TabId),
}
