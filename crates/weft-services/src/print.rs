//! Print manager contract

use crate::types::{EndpointId, TabId};

pub trait PrintService: Send + Sync {
    /// Starts a print job for `tab`. `false` means printing is unavailable.
    fn begin(&self, tab: TabId) -> bool;
    fn stop(&self, tab: TabId);
    /// Returns `true` if the tab should go on handling the loss of
    /// `endpoint`, `false` if the print subsystem owned it.
    fn render_view_gone(&self, tab: TabId, endpoint: EndpointId) -> bool;
    fn did_get_printed_pages_count(&self, tab: TabId, cookie: i32, page_count: i32);
    fn did_print_page(&self, tab: TabId, cookie: i32, page_number: i32);
}
