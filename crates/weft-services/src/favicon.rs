//! Favicon fetcher contract

use url::Url;

use weft_navigation::Bitmap;

use crate::types::TabId;

pub trait FaviconService: Send + Sync {
    /// Looks up (or downloads) the icon for a freshly committed page.
    fn fetch(&self, tab: TabId, page_url: &Url);
    /// The page declared its icon URL.
    fn set_url(&self, tab: TabId, icon_url: &Url);
    /// An icon download finished.
    fn set_icon(&self, tab: TabId, download_id: i32, icon_url: &Url, bitmap: &Bitmap);
    fn download_failed(&self, tab: TabId, download_id: i32);
}
