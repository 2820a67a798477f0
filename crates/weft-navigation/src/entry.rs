//! Navigation entries

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::site::SiteInstance;
use crate::transition::PageTransition;

/// Page id of an entry that has not been committed by a content process.
pub const INVALID_PAGE_ID: i32 = -1;

const VIEW_SOURCE_SCHEME: &str = "view-source";

/// Decoded image data. Empty when width or height is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favicon {
    pub url: Option<Url>,
    pub bitmap: Bitmap,
    /// Set once a bitmap (possibly the default icon) has been decided on.
    pub is_valid: bool,
}

/// A syndication feed advertised by a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedLink {
    pub url: Url,
    pub title: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationEntry {
    pub url: Url,
    /// What the user typed, if it differs from `url` (e.g. before fixup).
    pub user_typed_url: Option<Url>,
    pub referrer: Option<Url>,
    pub transition: PageTransition,
    pub page_id: i32,
    pub title: String,
    pub favicon: Favicon,
    /// Opaque serialized form and scroll state owned by the content process.
    pub content_state: Vec<u8>,
    pub feedlist: Vec<FeedLink>,
    pub has_post_data: bool,
    #[serde(skip)]
    pub site_instance: Option<Arc<SiteInstance>>,
}

impl NavigationEntry {
    pub fn new(url: Url, referrer: Option<Url>, transition: PageTransition) -> Self {
        Self {
            url,
            user_typed_url: None,
            referrer,
            transition,
            page_id: INVALID_PAGE_ID,
            title: String::new(),
            favicon: Favicon::default(),
            content_state: Vec::new(),
            feedlist: Vec::new(),
            has_post_data: false,
            site_instance: None,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.page_id != INVALID_PAGE_ID
    }

    pub fn is_view_source_mode(&self) -> bool {
        self.url.scheme() == VIEW_SOURCE_SCHEME
    }

    /// The URL shown to the user: what they typed if present, otherwise the
    /// entry URL.
    pub fn display_url(&self) -> &Url {
        self.user_typed_url.as_ref().unwrap_or(&self.url)
    }

    /// Title text for tab strips and history. Falls back to the file name for
    /// `file:` URLs and to the URL itself.
    pub fn title_for_display(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }
        if let Some(name) = file_name_for_url(&self.url) {
            return name;
        }
        self.display_url().to_string()
    }

    pub fn belongs_to(&self, instance: &SiteInstance) -> bool {
        self.site_instance
            .as_deref()
            .is_some_and(|own| own.id() == instance.id())
    }
}

/// The last path component of a `file:` URL, if any.
pub fn file_name_for_url(url: &Url) -> Option<String> {
    if url.scheme() != "file" {
        return None;
    }
    let path = url.to_file_path().ok()?;
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
