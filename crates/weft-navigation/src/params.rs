//! Parameters of a committed frame navigation

use serde::{Deserialize, Serialize};
use url::Url;

use crate::entry::INVALID_PAGE_ID;
use crate::forms::PasswordForm;
use crate::transition::PageTransition;

/// What a content process reports when a frame commits a navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameNavigateParams {
    /// `-1` when no document was produced (e.g. a `javascript:` URL).
    pub page_id: i32,
    pub url: Url,
    pub referrer: Option<Url>,
    pub transition: PageTransition,
    /// Redirect chain ending in `url`. Empty when there were no redirects.
    pub redirects: Vec<Url>,
    pub should_update_history: bool,
    /// Set when a form with a single search field was submitted.
    pub searchable_form_url: Option<Url>,
    pub searchable_form_encoding: String,
    pub password_form: Option<PasswordForm>,
    pub contents_mime_type: String,
    pub is_post: bool,
}

impl FrameNavigateParams {
    pub fn new(page_id: i32, url: Url, transition: PageTransition) -> Self {
        Self {
            page_id,
            url,
            referrer: None,
            transition,
            redirects: Vec::new(),
            should_update_history: true,
            searchable_form_url: None,
            searchable_form_encoding: String::new(),
            password_form: None,
            contents_mime_type: "text/html".to_string(),
            is_post: false,
        }
    }

    pub fn is_main_frame(&self) -> bool {
        self.transition.is_main_frame()
    }

    pub fn produced_document(&self) -> bool {
        self.page_id != INVALID_PAGE_ID
    }
}
