//! History service contract
//!
//! Never called for incognito profiles.

use serde::{Deserialize, Serialize};
use url::Url;

use weft_navigation::{Bitmap, PageTransition};

use crate::types::TabId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPageRequest {
    pub url: Url,
    pub tab: TabId,
    pub page_id: i32,
    pub referrer: Option<Url>,
    pub transition: PageTransition,
    pub redirects: Vec<Url>,
}

/// How good a thumbnail is; lower `boring_score` is better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailScore {
    pub boring_score: f64,
    pub good_clipping: bool,
    pub at_top: bool,
}

pub trait HistoryService: Send + Sync {
    fn add_page(&self, request: AddPageRequest);
    fn set_page_title(&self, url: &Url, title: &str);
    fn set_page_thumbnail(&self, url: &Url, bitmap: &Bitmap, score: ThumbnailScore);
    fn set_favicon_out_of_date(&self, url: &Url);
}
