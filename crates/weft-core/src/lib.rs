//! Weft Core
//!
//! The browser shell: owns the profile, the database-backed services and
//! every open tab, and routes renderer events to the tab they belong to.

mod bookmarks;
mod browser;
mod config;
mod error;
mod history;

pub use bookmarks::{normalize_folder, Bookmark, BookmarkStore};
pub use browser::{Browser, RoutedEvent};
pub use config::Config;
pub use error::CoreError;
pub use history::SqliteHistory;

pub use weft_navigation::{NavigationError, PageTransition, TransitionType};
pub use weft_services::{Profile, ProcessServices, ShutdownSignal, TabId};
pub use weft_storage::{Database, StorageError};
pub use weft_tabs::{EndpointFactory, InboundEvent, Tab, TabDelegate, TabError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over
/// `default_filter`. Calling it twice is harmless.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
