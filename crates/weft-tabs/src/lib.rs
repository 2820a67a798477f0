//! Weft Tabs
//!
//! The tab controller. A `Tab` owns a navigation controller and a
//! `RendererManager`; the manager owns one or two endpoints to content
//! processes and runs the cross-site swap protocol between them.
//!
//! All state lives on the UI thread. Content processes, the resource loader
//! and the shell talk to a tab only through events and messages.

mod constrained;
mod delegate;
mod dom_ui;
mod endpoint;
mod error;
mod host;
mod infobar;
mod manager;
mod messages;
mod state;
mod tab;
mod web_prefs;

#[cfg(test)]
mod testing;

pub use constrained::{ConstrainedWindow, ConstrainedWindowId};
pub use delegate::{HtmlDialogRequest, InvalidateFlags, TabDelegate};
pub use dom_ui::{DomUi, DOM_UI_SCHEME};
pub use endpoint::{CreateViewParams, EndpointFactory, ProcessEndpoint};
pub use error::TabError;
pub use host::{EndpointHost, UnloadReason};
pub use infobar::{AlertInfoBar, InfoBarDelegate};
pub use manager::{BeforeUnloadOutcome, NavigateOutcome, RendererManager, Swap, ViewContext};
pub use messages::{
    ApplicationInfo, InboundEvent, NavigateParams, OutboundMessage, WindowOpenDisposition,
    ERR_ABORTED,
};
pub use state::{LoadState, ManagerState};
pub use tab::{Tab, TabContext, TabSettings};
pub use web_prefs::WebPreferences;

pub type Result<T> = std::result::Result<T, TabError>;
