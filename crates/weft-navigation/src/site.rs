//! Site instances and browsing instances
//!
//! A `SiteInstance` is the isolation group a committed page belongs to. Pages
//! that reach each other through script (same `BrowsingInstance`, same site)
//! share one instance and therefore one content process.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::site_for_url;
use crate::entry::INVALID_PAGE_ID;

static NEXT_SITE_INSTANCE_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteInstanceId(pub u32);

impl SiteInstanceId {
    fn next() -> Self {
        Self(NEXT_SITE_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SiteInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of site instances that can script each other. Within one browsing
/// instance there is at most one live `SiteInstance` per site.
#[derive(Default)]
pub struct BrowsingInstance {
    sites: Mutex<HashMap<String, Weak<SiteInstance>>>,
}

impl BrowsingInstance {
    fn lookup(&self, site: &str) -> Option<Arc<SiteInstance>> {
        self.sites.lock().get(site).and_then(Weak::upgrade)
    }

    fn register(&self, site: String, instance: &Arc<SiteInstance>) {
        self.sites.lock().insert(site, Arc::downgrade(instance));
    }

    /// Number of sites currently holding a live instance.
    pub fn live_site_count(&self) -> usize {
        self.sites
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

pub struct SiteInstance {
    id: SiteInstanceId,
    browsing_instance: Arc<BrowsingInstance>,
    site: RwLock<Option<String>>,
    max_page_id: AtomicI32,
}

impl SiteInstance {
    /// A fresh instance in a fresh browsing instance, with no site yet.
    pub fn create() -> Arc<Self> {
        Self::new_in(Arc::new(BrowsingInstance::default()))
    }

    /// A fresh instance already bound to the site of `url`.
    pub fn for_url(url: &Url) -> Arc<Self> {
        let instance = Self::create();
        instance.set_site(url);
        instance
    }

    fn new_in(browsing_instance: Arc<BrowsingInstance>) -> Arc<Self> {
        Arc::new(Self {
            id: SiteInstanceId::next(),
            browsing_instance,
            site: RwLock::new(None),
            max_page_id: AtomicI32::new(INVALID_PAGE_ID),
        })
    }

    pub fn id(&self) -> SiteInstanceId {
        self.id
    }

    /// The content process this instance is hosted in. Every instance gets
    /// its own process.
    pub fn process_id(&self) -> u32 {
        self.id.0
    }

    pub fn browsing_instance(&self) -> &Arc<BrowsingInstance> {
        &self.browsing_instance
    }

    pub fn has_site(&self) -> bool {
        self.site.read().is_some()
    }

    pub fn site(&self) -> Option<String> {
        self.site.read().clone()
    }

    /// Binds this instance to the site of `url`. A site is assigned once;
    /// later calls are ignored.
    pub fn set_site(self: &Arc<Self>, url: &Url) {
        let mut site = self.site.write();
        if site.is_some() {
            return;
        }
        let key = site_for_url(url);
        self.browsing_instance.register(key.clone(), self);
        tracing::debug!(site_instance = %self.id, site = %key, "Site assigned");
        *site = Some(key);
    }

    /// The instance, within the same browsing instance, that `url` should be
    /// rendered in. Reuses `self` when the site matches or `self` has no site.
    pub fn related_site_instance(self: &Arc<Self>, url: &Url) -> Arc<SiteInstance> {
        let key = site_for_url(url);
        match self.site.read().as_deref() {
            None => return Arc::clone(self),
            Some(site) if site == key => return Arc::clone(self),
            Some(_) => {}
        }

        if let Some(existing) = self.browsing_instance.lookup(&key) {
            return existing;
        }

        let instance = Self::new_in(Arc::clone(&self.browsing_instance));
        instance.set_site(url);
        instance
    }

    /// True if a page at `url` belongs in this instance.
    pub fn matches_url(&self, url: &Url) -> bool {
        match self.site.read().as_deref() {
            None => true,
            Some(site) => site == site_for_url(url),
        }
    }

    pub fn max_page_id(&self) -> i32 {
        self.max_page_id.load(Ordering::SeqCst)
    }

    /// Raises `max_page_id` to `page_id`. Never lowers it.
    pub fn update_max_page_id(&self, page_id: i32) {
        self.max_page_id.fetch_max(page_id, Ordering::SeqCst);
    }
}

impl PartialEq for SiteInstance {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SiteInstance {}

impl fmt::Debug for SiteInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteInstance")
            .field("id", &self.id)
            .field("site", &*self.site.read())
            .field("max_page_id", &self.max_page_id())
            .finish()
    }
}
