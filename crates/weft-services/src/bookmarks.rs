//! Bookmark store contract

use url::Url;

pub trait BookmarkService: Send + Sync {
    fn is_loaded(&self) -> bool;
    fn is_bookmarked(&self, url: &Url) -> bool;
}
