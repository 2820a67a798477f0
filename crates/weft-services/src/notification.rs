//! Notification bus
//!
//! Broadcasts typed notifications to every subscriber. Each subscriber gets
//! its own unbounded channel; dropped receivers are pruned on the next send.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;

use weft_navigation::{NavigationType, PageTransition};

use crate::types::{Rect, TabId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    LoadStart,
    LoadStop,
    TabContentsConnected,
    TabContentsDisconnected,
    TabContentsSwapped,
    TabContentsHidden,
    TabContentsDestroyed,
    FrameProvisionalLoadStart,
    FailProvisionalLoadWithError,
    LoadFromMemoryCache,
    FindResultAvailable,
    DomOperationResponse,
    DomInspectElementResponse,
    NavEntryCommitted,
    UrlsStarred,
    BookmarkModelLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSource {
    Tab(TabId),
    Profile(Uuid),
}

/// Sent with `LoadStop` when the tab had an active entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadDetails {
    pub url: Url,
    pub transition: PageTransition,
    pub elapsed: Duration,
    pub entry_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionalLoadDetails {
    pub is_main_frame: bool,
    pub is_in_page: bool,
    pub url: Url,
    pub error_code: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindResult {
    pub request_id: i32,
    pub number_of_matches: i32,
    pub selection_rect: Rect,
    pub active_match_ordinal: i32,
    pub final_update: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationDetails {
    None,
    Load(LoadDetails),
    ProvisionalLoad(ProvisionalLoadDetails),
    MemoryCacheLoad {
        url: Url,
        frame_origin: String,
        main_frame_origin: String,
        security_info: String,
    },
    Find(FindResult),
    DomOperation {
        json: String,
        automation_id: i32,
    },
    InspectElement {
        num_resources: i32,
    },
    Committed {
        url: Url,
        page_id: i32,
        nav_type: NavigationType,
        is_main_frame: bool,
    },
    Starred {
        urls: Vec<Url>,
        starred: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub source: NotificationSource,
    pub details: NotificationDetails,
}

impl Notification {
    pub fn new(kind: NotificationKind, source: NotificationSource) -> Self {
        Self {
            kind,
            source,
            details: NotificationDetails::None,
        }
    }

    pub fn with_details(mut self, details: NotificationDetails) -> Self {
        self.details = details;
        self
    }

    pub fn from_tab(kind: NotificationKind, tab: TabId) -> Self {
        Self::new(kind, NotificationSource::Tab(tab))
    }

    pub fn tab(&self) -> Option<TabId> {
        match self.source {
            NotificationSource::Tab(id) => Some(id),
            NotificationSource::Profile(_) => None,
        }
    }
}

#[derive(Clone, Default)]
pub struct NotificationBus {
    subscribers: Arc<RwLock<Vec<mpsc::UnboundedSender<Notification>>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().push(tx);
        rx
    }

    pub fn notify(&self, notification: Notification) {
        tracing::trace!(kind = ?notification.kind, source = ?notification.source, "Notify");
        self.subscribers
            .write()
            .retain(|subscriber| subscriber.send(notification.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Drops every subscriber. Receivers see the channel close.
    pub fn clear(&self) {
        self.subscribers.write().clear();
    }
}
