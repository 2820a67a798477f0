//! Renderer manager
//!
//! Owns the tab's current endpoint and, during a cross-site navigation, the
//! pending one. The pending endpoint is created suspended; it receives its
//! navigation only after the current page's beforeunload handler says
//! "proceed", and its response is held by the loader until the current page
//! has run its unload handler. When the pending endpoint commits, it replaces
//! the current one and the old endpoint is shut down.

use std::sync::Arc;

use url::Url;

use weft_navigation::{NavigationEntry, SiteInstance};
use weft_services::{
    CrossSiteRequestRegistry, EndpointId, GlobalRequestId, ResourceLoader, TabId,
};

use crate::dom_ui::DomUi;
use crate::endpoint::{CreateViewParams, EndpointFactory};
use crate::error::TabError;
use crate::host::{EndpointHost, UnloadReason};
use crate::messages::OutboundMessage;
use crate::state::ManagerState;
use crate::web_prefs::WebPreferences;
use crate::Result;

/// Tab state a freshly created view is initialized from.
#[derive(Debug, Clone)]
pub struct ViewContext {
    pub web_prefs: WebPreferences,
    pub alternate_error_page_url: Option<Url>,
    pub max_restored_page_id: i32,
}

/// The current endpoint was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swap {
    pub old: EndpointId,
    pub new: EndpointId,
    pub new_is_live: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigateOutcome {
    /// The endpoint that should carry the navigation.
    pub endpoint: EndpointId,
    pub swap: Option<Swap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeforeUnloadOutcome {
    /// No beforeunload was outstanding.
    Ignored,
    /// The pending endpoint may now navigate.
    CrossSiteProceeding,
    /// The user stayed on the page; the pending endpoint is gone.
    CrossSiteCanceled,
    /// The unload handler is running; its ack closes the tab.
    TabCloseUnloading,
    /// Nothing left to run; close the tab now.
    TabCloseNow,
    TabCloseCanceled,
}

pub struct RendererManager {
    tab: TabId,
    factory: Arc<dyn EndpointFactory>,
    registry: CrossSiteRequestRegistry,
    loader: Option<Arc<dyn ResourceLoader>>,
    current: EndpointHost,
    pending: Option<EndpointHost>,
    dom_ui: Option<DomUi>,
    pending_dom_ui: Option<DomUi>,
    closing: bool,
}

impl RendererManager {
    /// Creates the manager with an endpoint for `site_instance`. The view is
    /// created on the first navigation.
    pub fn new(
        tab: TabId,
        factory: Arc<dyn EndpointFactory>,
        registry: CrossSiteRequestRegistry,
        loader: Option<Arc<dyn ResourceLoader>>,
        site_instance: Arc<SiteInstance>,
    ) -> Result<Self> {
        let endpoint = factory
            .create_endpoint(tab, &site_instance)
            .ok_or(TabError::EndpointCreationFailed(site_instance.id()))?;

        Ok(Self {
            tab,
            factory,
            registry,
            loader,
            current: EndpointHost::new(endpoint),
            pending: None,
            dom_ui: None,
            pending_dom_ui: None,
            closing: false,
        })
    }

    pub fn state(&self) -> ManagerState {
        if self.pending.is_some() {
            ManagerState::Pending
        } else {
            ManagerState::Normal
        }
    }

    pub fn current(&self) -> &EndpointHost {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut EndpointHost {
        &mut self.current
    }

    pub fn pending(&self) -> Option<&EndpointHost> {
        self.pending.as_ref()
    }

    pub fn is_current(&self, endpoint: EndpointId) -> bool {
        self.current.id() == endpoint
    }

    pub fn is_pending(&self, endpoint: EndpointId) -> bool {
        self.pending.as_ref().is_some_and(|pending| pending.id() == endpoint)
    }

    pub fn host(&self, endpoint: EndpointId) -> Option<&EndpointHost> {
        if self.is_current(endpoint) {
            return Some(&self.current);
        }
        self.pending.as_ref().filter(|pending| pending.id() == endpoint)
    }

    pub fn host_mut(&mut self, endpoint: EndpointId) -> Option<&mut EndpointHost> {
        if self.current.id() == endpoint {
            return Some(&mut self.current);
        }
        self.pending.as_mut().filter(|pending| pending.id() == endpoint)
    }

    pub fn dom_ui(&self) -> Option<&DomUi> {
        self.dom_ui.as_ref()
    }

    pub fn dom_ui_mut(&mut self) -> Option<&mut DomUi> {
        self.dom_ui.as_mut()
    }

    pub fn pending_dom_ui(&self) -> Option<&DomUi> {
        self.pending_dom_ui.as_ref()
    }

    /// Picks (creating if needed) the endpoint that should load `entry`.
    pub fn navigate(
        &mut self,
        entry: &NavigationEntry,
        last_committed: Option<&NavigationEntry>,
        context: &ViewContext,
    ) -> Result<NavigateOutcome> {
        self.pending_dom_ui = DomUi::for_url(&entry.url);
        let dom_ui_bindings = self.pending_dom_ui.is_some();

        let current_instance = Arc::clone(self.current.site_instance());
        let new_instance = match &entry.site_instance {
            Some(instance) => Arc::clone(instance),
            None => current_instance.related_site_instance(&entry.url),
        };
        let force_swap = last_committed.is_some_and(|current| should_swap_processes(current, entry));

        if !force_swap && new_instance.id() == current_instance.id() {
            if self.pending.is_some() {
                tracing::debug!(tab_id = %self.tab, "Navigation back to the current site cancels the pending endpoint");
                self.cancel_pending_endpoint();
            }
            Self::ensure_view(&mut self.current, context, dom_ui_bindings, entry)?;
            return Ok(NavigateOutcome {
                endpoint: self.current.id(),
                swap: None,
            });
        }

        let reuse_pending = !force_swap
            && self
                .pending
                .as_ref()
                .is_some_and(|pending| pending.site_instance().id() == new_instance.id());
        if !reuse_pending {
            self.cancel_pending_endpoint();
            let pending = self.create_pending(&new_instance, context, dom_ui_bindings, entry)?;
            self.pending = Some(pending);
        }

        if !self.current.is_live() {
            // Nothing to unload; the pending endpoint takes over right away.
            let swap = self.commit_pending();
            return Ok(NavigateOutcome {
                endpoint: self.current.id(),
                swap,
            });
        }

        let Some(pending) = self.pending.as_mut() else {
            return Err(TabError::EndpointCreationFailed(new_instance.id()));
        };
        let endpoint = pending.id();
        if !reuse_pending {
            pending.set_navigations_suspended(true);
            self.current.fire_page_before_unload(UnloadReason::CrossSite);
            tracing::info!(
                tab_id = %self.tab,
                current = %self.current.id(),
                pending = %endpoint,
                url = %entry.url,
                "Cross-site navigation started"
            );
        }

        Ok(NavigateOutcome {
            endpoint,
            swap: None,
        })
    }

    fn create_pending(
        &self,
        instance: &Arc<SiteInstance>,
        context: &ViewContext,
        dom_ui_bindings: bool,
        entry: &NavigationEntry,
    ) -> Result<EndpointHost> {
        let endpoint = self
            .factory
            .create_endpoint(self.tab, instance)
            .ok_or(TabError::EndpointCreationFailed(instance.id()))?;
        let mut host = EndpointHost::new(endpoint);
        Self::ensure_view(&mut host, context, dom_ui_bindings, entry)?;
        Ok(host)
    }

    fn ensure_view(
        host: &mut EndpointHost,
        context: &ViewContext,
        dom_ui_bindings: bool,
        entry: &NavigationEntry,
    ) -> Result<()> {
        if !host.is_live() {
            let web_prefs = if dom_ui_bindings {
                context.web_prefs.clone().for_dom_ui()
            } else {
                context.web_prefs.clone()
            };
            let params = CreateViewParams {
                web_prefs,
                dom_ui_bindings,
            };
            if !host.create_view(&params) {
                tracing::error!(endpoint = %host.id(), "Failed to create view");
                return Err(TabError::EndpointCreationFailed(host.site_instance().id()));
            }
            if dom_ui_bindings {
                host.send(OutboundMessage::AllowDomUiBindings);
            }
            update_max_page_id_if_necessary(host, context.max_restored_page_id);
            host.send(OutboundMessage::SetAlternateErrorPageUrl(
                context.alternate_error_page_url.clone(),
            ));
        }

        if entry.is_view_source_mode() {
            host.send(OutboundMessage::EnableViewSourceMode);
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        self.current.stop();
        if let Some(pending) = self.pending.as_mut() {
            pending.stop();
        }
    }

    /// Forgets every endpoint's load once the tab has stopped loading.
    pub fn clear_loading(&mut self) {
        self.current.set_is_loading(false);
        if let Some(pending) = self.pending.as_mut() {
            pending.set_is_loading(false);
        }
    }

    /// True while an endpoint that is still attached has a load in progress.
    pub fn has_load_in_progress(&self) -> bool {
        self.current.is_loading() || self.pending.as_ref().is_some_and(EndpointHost::is_loading)
    }

    /// Starts closing the tab by running the current page's beforeunload
    /// handler. Returns false if the page is not live and the tab can close
    /// immediately.
    pub fn fire_close_before_unload(&mut self) -> bool {
        self.closing = true;
        self.current.fire_page_before_unload(UnloadReason::TabClose)
    }

    /// The current page's beforeunload handler answered.
    pub fn before_unload_fired<F>(&mut self, proceed: bool, proceed_to_fire_unload: F) -> BeforeUnloadOutcome
    where
        F: FnOnce(bool) -> bool,
    {
        match self.current.take_before_unload_reason() {
            None => {
                tracing::debug!(tab_id = %self.tab, "Unexpected beforeunload ack");
                BeforeUnloadOutcome::Ignored
            }
            Some(UnloadReason::CrossSite) => {
                let Some(pending) = self.pending.as_mut() else {
                    return BeforeUnloadOutcome::Ignored;
                };
                if proceed {
                    self.registry.set_has_pending_cross_site_request(pending.id(), true);
                    pending.set_navigations_suspended(false);
                    BeforeUnloadOutcome::CrossSiteProceeding
                } else {
                    tracing::info!(tab_id = %self.tab, "Cross-site navigation canceled by beforeunload");
                    self.cancel_pending();
                    BeforeUnloadOutcome::CrossSiteCanceled
                }
            }
            Some(UnloadReason::TabClose) => {
                if !proceed_to_fire_unload(proceed) {
                    self.closing = false;
                    return BeforeUnloadOutcome::TabCloseCanceled;
                }
                if self.current.close_page(None) {
                    BeforeUnloadOutcome::TabCloseUnloading
                } else {
                    BeforeUnloadOutcome::TabCloseNow
                }
            }
        }
    }

    /// The loader has the pending endpoint's response and is holding it until
    /// the current page unloads.
    pub fn on_cross_site_response(&mut self, request: GlobalRequestId) {
        let Some(pending) = self.pending.as_mut() else {
            tracing::warn!(tab_id = %self.tab, "Cross-site response without a pending endpoint");
            return;
        };
        pending.set_pending_request(Some(request));
        self.registry.set_has_pending_cross_site_request(pending.id(), false);

        if !self.current.close_page(Some(request)) {
            self.resume_response(request);
        }
    }

    /// The current page finished unloading.
    pub fn on_close_page_ack(&mut self, request: GlobalRequestId) {
        self.current.set_unload_listener_has_fired(true);
        self.resume_response(request);
    }

    /// The pending response turned out to be a download. The pending endpoint
    /// is stopped but kept until the next navigation or commit.
    pub fn cross_site_download_detected(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        pending.stop();
        pending.set_download_detected();
        self.registry.set_has_pending_cross_site_request(pending.id(), false);
        tracing::info!(tab_id = %self.tab, pending = %pending.id(), "Cross-site response is a download");
    }

    pub fn renderer_aborted_provisional_load(&mut self, endpoint: EndpointId) {
        let abort = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.id() == endpoint && !pending.download_detected());
        if abort {
            tracing::debug!(tab_id = %self.tab, pending = %endpoint, "Pending endpoint aborted its load");
            self.cancel_pending();
        }
    }

    /// A main frame committed in `endpoint`. Swaps if it was the pending one.
    pub fn did_navigate_main_frame(&mut self, endpoint: EndpointId) -> Option<Swap> {
        if self.pending.is_none() {
            if self.pending_dom_ui.is_some() {
                self.dom_ui = self.pending_dom_ui.take();
            }
            return None;
        }

        if self.is_pending(endpoint) {
            return self.commit_pending();
        }
        if self.is_current(endpoint) {
            // The old page navigated on its own; the cross-site load is moot.
            self.cancel_pending();
        }
        None
    }

    /// The current endpoint hung in beforeunload or unload. Returns true if
    /// the tab should be closed; otherwise the cross-site navigation is let
    /// through.
    pub fn should_close_tab_on_unresponsive_renderer(&mut self) -> bool {
        if self.closing {
            return true;
        }
        let Some(pending) = self.pending.as_mut() else {
            return true;
        };

        match pending.pending_request() {
            None => {
                self.current.take_before_unload_reason();
                self.registry.set_has_pending_cross_site_request(pending.id(), true);
                pending.set_navigations_suspended(false);
            }
            Some(request) => self.resume_response(request),
        }
        false
    }

    fn resume_response(&self, request: GlobalRequestId) {
        match &self.loader {
            Some(loader) => loader.resume_paused_response(request),
            None => tracing::warn!(tab_id = %self.tab, request_id = request.request_id, "No loader to resume response"),
        }
    }

    fn commit_pending(&mut self) -> Option<Swap> {
        self.dom_ui = self.pending_dom_ui.take();
        let pending = self.pending.take()?;

        let mut old = std::mem::replace(&mut self.current, pending);
        self.registry.set_has_pending_cross_site_request(self.current.id(), false);
        self.registry.set_has_pending_cross_site_request(old.id(), false);
        old.shutdown();

        let swap = Swap {
            old: old.id(),
            new: self.current.id(),
            new_is_live: self.current.is_live(),
        };
        tracing::info!(tab_id = %self.tab, old = %swap.old, new = %swap.new, "Swapped endpoints");
        Some(swap)
    }

    fn cancel_pending_endpoint(&mut self) {
        if let Some(mut pending) = self.pending.take() {
            self.registry.set_has_pending_cross_site_request(pending.id(), false);
            pending.shutdown();
        }
    }

    /// Drops the pending endpoint and pending DOM UI.
    pub fn cancel_pending(&mut self) {
        self.cancel_pending_endpoint();
        self.pending_dom_ui = None;
    }

    /// Shuts down both endpoints, pending first.
    pub fn shutdown(&mut self) {
        self.cancel_pending();
        self.registry.set_has_pending_cross_site_request(self.current.id(), false);
        self.current.shutdown();
    }
}

/// Navigating between DOM UI and web pages, or into or out of view-source
/// mode, always needs a new process.
fn should_swap_processes(current: &NavigationEntry, new: &NavigationEntry) -> bool {
    DomUi::has_dom_ui_scheme(&current.url) != DomUi::has_dom_ui_scheme(&new.url)
        || current.is_view_source_mode() != new.is_view_source_mode()
}

/// Restored entries carry page ids from an earlier process. Make sure the
/// site instance and the endpoint hand out ids above them.
fn update_max_page_id_if_necessary(host: &mut EndpointHost, max_restored_page_id: i32) {
    let instance = Arc::clone(host.site_instance());
    let current_max = instance.max_page_id();
    if max_restored_page_id > 0 && max_restored_page_id > current_max {
        instance.update_max_page_id(max_restored_page_id);
        host.send(OutboundMessage::ReservePageIdRange(
            max_restored_page_id - current_max.max(0),
        ));
    }
}
