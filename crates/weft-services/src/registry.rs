//! Cross-site request registry
//!
//! Written on the UI thread when a pending endpoint is cleared to send its
//! navigation; read by the loader when it classifies the response. A marked
//! endpoint gets its response paused until the old page has run unload.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::EndpointId;

#[derive(Clone, Default)]
pub struct CrossSiteRequestRegistry {
    pending: Arc<RwLock<HashSet<EndpointId>>>,
}

impl CrossSiteRequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending_cross_site_request(&self, endpoint: EndpointId) -> bool {
        self.pending.read().contains(&endpoint)
    }

    pub fn set_has_pending_cross_site_request(&self, endpoint: EndpointId, has_pending: bool) {
        let mut pending = self.pending.write();
        if has_pending {
            pending.insert(endpoint);
        } else {
            pending.remove(&endpoint);
        }
        tracing::debug!(endpoint = %endpoint, has_pending, "Cross-site request flag updated");
    }

    pub fn len(&self) -> usize {
        self.pending.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.read().is_empty()
    }
}
