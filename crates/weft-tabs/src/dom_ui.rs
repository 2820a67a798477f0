//! DOM UI
//!
//! Pages under the `weft:` scheme are privileged browser pages. Each one gets
//! a `DomUi` token that carries its presentation overrides and the message
//! handlers its bindings may call into. Moving between a DOM UI page and a
//! web page always changes process.

use std::collections::HashMap;
use std::fmt;

use url::Url;

use weft_navigation::{PageTransition, TransitionType};

pub const DOM_UI_SCHEME: &str = "weft";

type MessageCallback = Box<dyn Fn(&str) + Send + Sync>;

pub struct DomUi {
    host: String,
    overridden_title: Option<String>,
    should_hide_url: bool,
    hide_favicon: bool,
    focus_location_bar_by_default: bool,
    force_bookmark_bar_visible: bool,
    link_transition: PageTransition,
    callbacks: HashMap<String, MessageCallback>,
}

impl DomUi {
    fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            overridden_title: None,
            should_hide_url: false,
            hide_favicon: false,
            focus_location_bar_by_default: false,
            force_bookmark_bar_visible: false,
            link_transition: PageTransition::default(),
            callbacks: HashMap::new(),
        }
    }

    /// The DOM UI for `url`, or `None` if it is an ordinary web page.
    pub fn for_url(url: &Url) -> Option<Self> {
        if !Self::has_dom_ui_scheme(url) {
            return None;
        }

        let host = url.host_str()?;
        let mut dom_ui = Self::new(host);
        match host {
            "newtab" => {
                dom_ui.overridden_title = Some("New Tab".to_string());
                dom_ui.should_hide_url = true;
                dom_ui.hide_favicon = true;
                dom_ui.focus_location_bar_by_default = true;
                dom_ui.force_bookmark_bar_visible = true;
                dom_ui.link_transition = PageTransition::new(TransitionType::AutoBookmark);
            }
            "history" => dom_ui.overridden_title = Some("History".to_string()),
            "downloads" => dom_ui.overridden_title = Some("Downloads".to_string()),
            "settings" => dom_ui.overridden_title = Some("Settings".to_string()),
            _ => return None,
        }
        Some(dom_ui)
    }

    pub fn has_dom_ui_scheme(url: &Url) -> bool {
        url.scheme() == DOM_UI_SCHEME
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn overridden_title(&self) -> Option<&str> {
        self.overridden_title.as_deref()
    }

    pub fn should_hide_url(&self) -> bool {
        self.should_hide_url
    }

    pub fn hide_favicon(&self) -> bool {
        self.hide_favicon
    }

    pub fn focus_location_bar_by_default(&self) -> bool {
        self.focus_location_bar_by_default
    }

    pub fn force_bookmark_bar_visible(&self) -> bool {
        self.force_bookmark_bar_visible
    }

    /// Transition to use for links clicked on this page.
    pub fn link_transition(&self) -> PageTransition {
        self.link_transition
    }

    pub fn register_message_callback<F>(&mut self, message: &str, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.insert(message.to_string(), Box::new(callback));
    }

    /// Runs the handler registered for `message`. Returns false if there is none.
    pub fn process_message(&self, message: &str, content: &str) -> bool {
        match self.callbacks.get(message) {
            Some(callback) => {
                callback(content);
                true
            }
            None => {
                tracing::debug!(dom_ui = %self.host, message, "Unhandled DOM UI message");
                false
            }
        }
    }
}

impl fmt::Debug for DomUi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomUi")
            .field("host", &self.host)
            .field("overridden_title", &self.overridden_title)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_new_tab_page_flags() {
        let dom_ui = DomUi::for_url(&url("weft://newtab/")).unwrap();
        assert_eq!(dom_ui.overridden_title(), Some("New Tab"));
        assert!(dom_ui.should_hide_url());
        assert!(dom_ui.hide_favicon());
        assert!(dom_ui.focus_location_bar_by_default());
        assert!(dom_ui.force_bookmark_bar_visible());
        assert_eq!(dom_ui.link_transition().core, TransitionType::AutoBookmark);
    }

    #[test]
    fn test_web_pages_have_no_dom_ui() {
        assert!(DomUi::for_url(&url("https://a.example/")).is_none());
        assert!(DomUi::for_url(&url("weft://unknown/")).is_none());
        assert!(!DomUi::for_url(&url("weft://history/")).unwrap().should_hide_url());
    }

    #[test]
    fn test_message_dispatch() {
        let mut dom_ui = DomUi::for_url(&url("weft://history/")).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        dom_ui.register_message_callback("searchHistory", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(dom_ui.process_message("searchHistory", "[\"rust\"]"));
        assert!(!dom_ui.process_message("deleteAll", ""));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
