//! Weft Storage Layer
//!
//! SQLite persistence for profile state: preferences and bookmarks in the
//! `settings` table, browsing history in `history_pages` / `history_visits`,
//! and page thumbnails.

mod database;
mod error;
mod history;
mod migrations;

pub use database::Database;
pub use error::StorageError;
pub use history::{HistoryPage, HistoryStore, HistoryVisit, NewVisit, Thumbnail};

pub type Result<T> = std::result::Result<T, StorageError>;
