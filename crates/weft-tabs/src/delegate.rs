//! Tab delegate
//!
//! The container (tab strip, popup frame) that hosts a tab. The tab refers
//! to its delegate only for the duration of a call it dispatches.

use bitflags::bitflags;
use url::Url;

use weft_navigation::PageTransition;
use weft_services::{Rect, TabId};

use crate::messages::WindowOpenDisposition;

bitflags! {
    /// Parts of the tab's UI that need repainting.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InvalidateFlags: u32 {
        const URL      = 1 << 0;
        const TITLE    = 1 << 1;
        const FAVICON  = 1 << 2;
        const LOAD     = 1 << 3;
        const FEEDLIST = 1 << 4;
    }
}

/// A modal HTML dialog requested by the page.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlDialogRequest {
    pub tab: TabId,
    pub reply_id: u64,
    pub url: Url,
    pub width: i32,
    pub height: i32,
    pub json_arguments: String,
}

#[allow(unused_variables)]
pub trait TabDelegate: Send + Sync {
    fn open_url(
        &self,
        source: TabId,
        url: &Url,
        referrer: Option<&Url>,
        disposition: WindowOpenDisposition,
        transition: PageTransition,
    ) {
    }

    fn navigation_state_changed(&self, tab: TabId, changed: InvalidateFlags) {}

    fn loading_state_changed(&self, tab: TabId) {}

    /// Something other than navigation or loading changed (e.g. the crashed
    /// flag or the download shelf).
    fn contents_state_changed(&self, tab: TabId) {}

    fn url_starred_changed(&self, tab: TabId, starred: bool) {}

    fn close_contents(&self, tab: TabId) {}

    /// Only honored for popups.
    fn move_contents(&self, tab: TabId, rect: Rect) {}

    fn is_popup(&self, tab: TabId) -> bool {
        false
    }

    /// True when the tab is itself shown inside another tab's constrained
    /// window.
    fn has_constraining_contents(&self, tab: TabId) -> bool {
        false
    }

    fn update_target_url(&self, tab: TabId, url: Option<&Url>) {}

    fn show_html_dialog(&self, request: HtmlDialogRequest) {}

    /// The beforeunload handler of a closing tab finished. Returns whether the
    /// unload handler should run next.
    fn before_unload_fired(&self, tab: TabId, proceed: bool) -> bool {
        proceed
    }
}
