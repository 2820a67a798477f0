//! Endpoint host
//!
//! Wraps a `ProcessEndpoint` with the bookkeeping the renderer manager needs
//! during a cross-site navigation: navigation suspension, the reason a
//! beforeunload is running, and the paused response waiting on unload.

use std::sync::Arc;

use weft_navigation::SiteInstance;
use weft_services::{EndpointId, GlobalRequestId};

use crate::endpoint::{CreateViewParams, ProcessEndpoint};
use crate::messages::{NavigateParams, OutboundMessage};

/// Why a beforeunload handler was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadReason {
    CrossSite,
    TabClose,
}

pub struct EndpointHost {
    endpoint: Box<dyn ProcessEndpoint>,
    navigations_suspended: bool,
    suspended_navigation: Option<NavigateParams>,
    before_unload_reason: Option<UnloadReason>,
    pending_request: Option<GlobalRequestId>,
    unload_listener_has_fired: bool,
    is_loading: bool,
    download_detected: bool,
    shut_down: bool,
}

impl EndpointHost {
    pub fn new(endpoint: Box<dyn ProcessEndpoint>) -> Self {
        Self {
            endpoint,
            navigations_suspended: false,
            suspended_navigation: None,
            before_unload_reason: None,
            pending_request: None,
            unload_listener_has_fired: false,
            is_loading: false,
            download_detected: false,
            shut_down: false,
        }
    }

    pub fn id(&self) -> EndpointId {
        self.endpoint.id()
    }

    pub fn site_instance(&self) -> &Arc<SiteInstance> {
        self.endpoint.site_instance()
    }

    pub fn is_live(&self) -> bool {
        !self.shut_down && self.endpoint.is_live()
    }

    pub fn create_view(&mut self, params: &CreateViewParams) -> bool {
        if self.shut_down {
            return false;
        }
        self.endpoint.create_view(params)
    }

    pub fn send(&mut self, message: OutboundMessage) -> bool {
        if !self.is_live() {
            tracing::trace!(endpoint = %self.id(), "Dropping message for dead endpoint");
            return false;
        }
        self.endpoint.send(message)
    }

    /// Sends the navigation now, or holds it until navigations are resumed.
    /// Only the most recent held navigation is kept.
    pub fn navigate(&mut self, params: NavigateParams) -> bool {
        if self.navigations_suspended {
            tracing::debug!(endpoint = %self.id(), url = %params.url, "Navigation held until beforeunload");
            self.suspended_navigation = Some(params);
            return true;
        }
        self.send(OutboundMessage::NavigateToEntry(params))
    }

    pub fn navigations_suspended(&self) -> bool {
        self.navigations_suspended
    }

    pub fn set_navigations_suspended(&mut self, suspend: bool) {
        self.navigations_suspended = suspend;
        if !suspend {
            if let Some(params) = self.suspended_navigation.take() {
                self.send(OutboundMessage::NavigateToEntry(params));
            }
        }
    }

    /// Asks the page whether it may be left. Returns false if the endpoint is
    /// not live, in which case the caller should act as if it said "proceed".
    pub fn fire_page_before_unload(&mut self, reason: UnloadReason) -> bool {
        if !self.is_live() {
            return false;
        }
        self.before_unload_reason = Some(reason);
        self.send(OutboundMessage::ShouldClose)
    }

    pub fn before_unload_reason(&self) -> Option<UnloadReason> {
        self.before_unload_reason
    }

    pub fn take_before_unload_reason(&mut self) -> Option<UnloadReason> {
        self.before_unload_reason.take()
    }

    /// Runs the page's unload handler. `request` is the paused cross-site
    /// response to release when it finishes.
    pub fn close_page(&mut self, request: Option<GlobalRequestId>) -> bool {
        if !self.is_live() {
            return false;
        }
        self.send(OutboundMessage::ClosePage { request })
    }

    pub fn stop(&mut self) {
        if self.is_live() {
            self.send(OutboundMessage::Stop);
        }
    }

    /// True between this endpoint's own start and stop loading reports.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn set_is_loading(&mut self, is_loading: bool) {
        self.is_loading = is_loading;
    }

    pub fn pending_request(&self) -> Option<GlobalRequestId> {
        self.pending_request
    }

    pub fn set_pending_request(&mut self, request: Option<GlobalRequestId>) {
        self.pending_request = request;
    }

    pub fn unload_listener_has_fired(&self) -> bool {
        self.unload_listener_has_fired
    }

    pub fn set_unload_listener_has_fired(&mut self, fired: bool) {
        self.unload_listener_has_fired = fired;
    }

    pub fn download_detected(&self) -> bool {
        self.download_detected
    }

    pub fn set_download_detected(&mut self) {
        self.download_detected = true;
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.suspended_navigation = None;
        self.endpoint.shutdown();
        tracing::debug!(endpoint = %self.id(), "Endpoint shut down");
    }
}

impl Drop for EndpointHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}
