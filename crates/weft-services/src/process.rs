//! Process-wide services
//!
//! Created once by the shell before any tab and torn down after the last tab
//! is gone. Tabs receive a clone; test doubles are injected the same way.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::hung::{HungRendererTracker, HungRendererUi};
use crate::notification::NotificationBus;
use crate::registry::CrossSiteRequestRegistry;
use crate::search::LastSearchString;
use crate::shutdown::ShutdownSignal;
use crate::types::{EndpointId, GlobalRequestId, TabId};

/// Developer tools agent host.
pub trait DevTools: Send + Sync {
    /// Called before a navigation is sent to `endpoint`.
    fn attach_to_agent(&self, tab: TabId, endpoint: EndpointId);
}

/// Renderer cache budget manager.
pub trait WebCache: Send + Sync {
    fn observe_activity(&self, process_id: u32);
}

/// The loader side of the cross-site protocol.
pub trait ResourceLoader: Send + Sync {
    /// Lets a response paused for the old page's unload flow to the new
    /// endpoint.
    fn resume_paused_response(&self, request: GlobalRequestId);
}

#[derive(Clone)]
pub struct ProcessServices {
    pub bus: NotificationBus,
    pub cross_site_requests: CrossSiteRequestRegistry,
    pub hung_renderer_ui: Arc<dyn HungRendererUi>,
    pub last_search: LastSearchString,
    pub clock: Arc<dyn Clock>,
    pub shutdown: ShutdownSignal,
    pub devtools: Option<Arc<dyn DevTools>>,
    pub web_cache: Option<Arc<dyn WebCache>>,
    pub loader: Option<Arc<dyn ResourceLoader>>,
}

impl ProcessServices {
    pub fn new() -> Self {
        tracing::debug!("Process services initialized");
        Self {
            bus: NotificationBus::new(),
            cross_site_requests: CrossSiteRequestRegistry::new(),
            hung_renderer_ui: Arc::new(HungRendererTracker::new()),
            last_search: LastSearchString::new(),
            clock: Arc::new(SystemClock),
            shutdown: ShutdownSignal::new(),
            devtools: None,
            web_cache: None,
            loader: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hung_renderer_ui(mut self, ui: Arc<dyn HungRendererUi>) -> Self {
        self.hung_renderer_ui = ui;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Signals shutdown, then closes every bus subscription.
    pub fn teardown(&self) {
        self.shutdown.trigger();
        self.bus.clear();
        tracing::debug!("Process services torn down");
    }
}

impl Default for ProcessServices {
    fn default() -> Self {
        Self::new()
    }
}
