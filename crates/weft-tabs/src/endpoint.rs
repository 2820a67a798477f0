//! Content process endpoints
//!
//! A `ProcessEndpoint` is the tab's handle to one view in one content
//! process. The transport behind it is not our concern; the tab only needs to
//! create the view, send outbound messages, and ask whether the process is
//! still alive.

use std::sync::Arc;

use weft_navigation::SiteInstance;
use weft_services::{EndpointId, TabId};

use crate::messages::OutboundMessage;
use crate::web_prefs::WebPreferences;

/// What a freshly created view needs before its first navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateViewParams {
    pub web_prefs: WebPreferences,
    pub dom_ui_bindings: bool,
}

pub trait ProcessEndpoint: Send {
    fn id(&self) -> EndpointId;

    fn site_instance(&self) -> &Arc<SiteInstance>;

    /// Starts the content process if needed and creates the view. Returns
    /// false if the process could not be launched.
    fn create_view(&mut self, params: &CreateViewParams) -> bool;

    fn is_live(&self) -> bool;

    /// Queues `message` for the content process. Returns false if it was not
    /// delivered.
    fn send(&mut self, message: OutboundMessage) -> bool;

    /// Tears down the view. Inbound events already in flight are dropped by
    /// the tab's identity checks.
    fn shutdown(&mut self);
}

pub trait EndpointFactory: Send + Sync {
    fn create_endpoint(
        &self,
        tab: TabId,
        site_instance: &Arc<SiteInstance>,
    ) -> Option<Box<dyn ProcessEndpoint>>;
}
