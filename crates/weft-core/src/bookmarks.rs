//! Bookmarks, persisted as one JSON list in the settings table.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use url::Url;

use weft_services::BookmarkService;
use weft_storage::Database;

use crate::Result;

const BOOKMARKS_KEY: &str = "bookmarks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub title: String,
    pub url: Url,
    #[serde(default)]
    pub folder: Option<String>,
}

pub fn normalize_folder(folder: Option<String>) -> Option<String> {
    folder
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The bookmark model tabs consult for their starred state.
pub struct BookmarkStore {
    db: Database,
    bookmarks: RwLock<Vec<Bookmark>>,
}

impl BookmarkStore {
    /// Reads the stored list. A corrupt list is logged and replaced by an
    /// empty one on the next write.
    pub fn load(db: Database) -> Result<Self> {
        let bookmarks = match db.get_setting(BOOKMARKS_KEY)? {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding unreadable bookmarks");
                Vec::new()
            }),
            None => Vec::new(),
        };
        tracing::debug!(count = bookmarks.len(), "Bookmarks loaded");
        Ok(Self {
            db,
            bookmarks: RwLock::new(bookmarks),
        })
    }

    pub fn all(&self) -> Vec<Bookmark> {
        self.bookmarks.read().clone()
    }

    pub fn folders(&self) -> Vec<String> {
        let mut folders: Vec<String> = self
            .bookmarks
            .read()
            .iter()
            .filter_map(|b| b.folder.clone())
            .collect();
        folders.sort();
        folders.dedup();
        folders
    }

    /// Adds `url`, or retitles and refiles it if it is already bookmarked.
    pub fn add(&self, url: Url, title: impl Into<String>, folder: Option<String>) -> Result<()> {
        let title = title.into();
        let folder = normalize_folder(folder);
        let mut bookmarks = self.bookmarks.write();
        if let Some(existing) = bookmarks.iter_mut().find(|b| b.url == url) {
            existing.title = title;
            existing.folder = folder;
        } else {
            tracing::info!(url = %url, "Bookmark added");
            bookmarks.push(Bookmark { title, url, folder });
        }
        self.persist(&bookmarks)
    }

    /// Returns whether anything was removed.
    pub fn remove(&self, url: &Url) -> Result<bool> {
        let mut bookmarks = self.bookmarks.write();
        let before = bookmarks.len();
        bookmarks.retain(|b| &b.url != url);
        if bookmarks.len() == before {
            return Ok(false);
        }
        tracing::info!(url = %url, "Bookmark removed");
        self.persist(&bookmarks)?;
        Ok(true)
    }

    fn persist(&self, bookmarks: &[Bookmark]) -> Result<()> {
        let serialized = serde_json::to_string(bookmarks)?;
        self.db.set_setting(BOOKMARKS_KEY, &serialized)?;
        Ok(())
    }
}

impl BookmarkService for BookmarkStore {
    fn is_loaded(&self) -> bool {
        true
    }

    fn is_bookmarked(&self, url: &Url) -> bool {
        self.bookmarks.read().iter().any(|b| &b.url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_add_and_reload() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::load(db.clone()).unwrap();
        store
            .add(url("https://example.com/"), "Example", Some("  Work ".into()))
            .unwrap();

        let reloaded = BookmarkStore::load(db).unwrap();
        let all = reloaded.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].folder.as_deref(), Some("Work"));
        assert!(reloaded.is_bookmarked(&url("https://example.com/")));
        assert!(!reloaded.is_bookmarked(&url("https://example.org/")));
    }

    #[test]
    fn test_add_existing_updates_in_place() {
        let store = BookmarkStore::load(Database::open_in_memory().unwrap()).unwrap();
        store.add(url("https://example.com/"), "Old", None).unwrap();
        store
            .add(url("https://example.com/"), "New", Some("Reading".into()))
            .unwrap();

        let all = store.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "New");
        assert_eq!(store.folders(), vec!["Reading".to_string()]);
    }

    #[test]
    fn test_remove() {
        let store = BookmarkStore::load(Database::open_in_memory().unwrap()).unwrap();
        store.add(url("https://example.com/"), "Example", None).unwrap();

        assert!(store.remove(&url("https://example.com/")).unwrap());
        assert!(!store.remove(&url("https://example.com/")).unwrap());
        assert!(store.all().is_empty());
    }

    #[test]
    fn test_corrupt_list_is_discarded() {
        let db = Database::open_in_memory().unwrap();
        db.set_setting(BOOKMARKS_KEY, "not json").unwrap();

        let store = BookmarkStore::load(db).unwrap();
        assert!(store.all().is_empty());
        assert!(store.is_loaded());
    }

    #[test]
    fn test_blank_folder_is_none() {
        assert_eq!(normalize_folder(Some("   ".into())), None);
        assert_eq!(normalize_folder(Some(" a/b ".into())), Some("a/b".into()));
    }
}
