//! Hung-renderer warning

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::types::TabId;

/// The "page is not responding" affordance. One per process, keyed by tab.
pub trait HungRendererUi: Send + Sync {
    fn show_for_tab(&self, tab: TabId);
    fn hide_for_tab(&self, tab: TabId);
}

/// Default implementation: remembers which tabs show the warning and logs
/// transitions. Shells with a real UI wrap or replace it.
#[derive(Default)]
pub struct HungRendererTracker {
    showing: Mutex<HashSet<TabId>>,
}

impl HungRendererTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_showing(&self, tab: TabId) -> bool {
        self.showing.lock().contains(&tab)
    }
}

impl HungRendererUi for HungRendererTracker {
    fn show_for_tab(&self, tab: TabId) {
        if self.showing.lock().insert(tab) {
            tracing::warn!(tab_id = %tab, "Renderer unresponsive");
        }
    }

    fn hide_for_tab(&self, tab: TabId) {
        if self.showing.lock().remove(&tab) {
            tracing::info!(tab_id = %tab, "Renderer responsive again");
        }
    }
}
