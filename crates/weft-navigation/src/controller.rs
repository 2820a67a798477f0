//! Navigation controller
//!
//! Owns the back/forward list of one tab. Entries become committed only when
//! a content process reports a `FrameNavigate`; until then the target lives in
//! the pending slot. A transient entry (interstitial) overrides both for
//! display but never enters the list.

use std::sync::Arc;

use url::Url;

use crate::entry::{NavigationEntry, INVALID_PAGE_ID};
use crate::error::NavigationError;
use crate::params::FrameNavigateParams;
use crate::site::SiteInstance;
use crate::transition::{PageTransition, TransitionQualifiers, TransitionType};
use crate::Result;

pub const DEFAULT_MAX_ENTRY_COUNT: usize = 50;

/// How a committed `FrameNavigate` relates to the existing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationType {
    /// A main-frame load with a page id never seen before.
    NewPage,
    /// Back/forward (or reload) to an entry already in the list.
    ExistingPage,
    /// The pending entry re-navigated to the URL already committed.
    SamePage,
    /// Only the fragment changed.
    InPage,
    /// A user-requested subframe load; gets its own entry.
    NewSubframe,
    /// A subframe load the user did not ask for; no new entry.
    AutoSubframe,
    /// Nothing to commit.
    Ignore,
}

/// What changed when an entry was committed.
#[derive(Debug, Clone)]
pub struct LoadCommittedDetails {
    pub entry: NavigationEntry,
    pub nav_type: NavigationType,
    pub is_main_frame: bool,
    pub is_in_page: bool,
    /// Redirects with no pending entry, i.e. not started by the user.
    pub is_auto: bool,
    pub previous_url: Option<Url>,
    pub previous_entry_index: Option<usize>,
}

impl LoadCommittedDetails {
    pub fn is_user_initiated_main_frame_load(&self) -> bool {
        !self.is_auto && !self.is_in_page && self.is_main_frame
    }
}

pub struct NavigationController {
    entries: Vec<NavigationEntry>,
    last_committed_index: Option<usize>,
    pending_entry: Option<NavigationEntry>,
    /// Index in `entries` the pending entry was copied from (back/forward, reload).
    pending_entry_index: Option<usize>,
    transient_entry: Option<NavigationEntry>,
    max_restored_page_id: i32,
    max_entry_count: usize,
    needs_reload: bool,
    load_pending_when_active: bool,
    active: bool,
}

impl NavigationController {
    pub fn new(max_entry_count: usize) -> Self {
        Self {
            entries: Vec::new(),
            last_committed_index: None,
            pending_entry: None,
            pending_entry_index: None,
            transient_entry: None,
            max_restored_page_id: INVALID_PAGE_ID,
            max_entry_count: max_entry_count.max(1),
            needs_reload: false,
            load_pending_when_active: false,
            active: true,
        }
    }

    // --- accessors -------------------------------------------------------

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[NavigationEntry] {
        &self.entries
    }

    pub fn entry_at_index(&self, index: usize) -> Option<&NavigationEntry> {
        self.entries.get(index)
    }

    pub fn entry_at_offset(&self, offset: i32) -> Option<&NavigationEntry> {
        self.index_for_offset(offset)
            .and_then(|index| self.entries.get(index))
    }

    pub fn last_committed_entry_index(&self) -> Option<usize> {
        self.last_committed_index
    }

    pub fn last_committed_entry(&self) -> Option<&NavigationEntry> {
        self.last_committed_index
            .and_then(|index| self.entries.get(index))
    }

    pub fn last_committed_entry_mut(&mut self) -> Option<&mut NavigationEntry> {
        match self.last_committed_index {
            Some(index) => self.entries.get_mut(index),
            None => None,
        }
    }

    pub fn pending_entry(&self) -> Option<&NavigationEntry> {
        self.pending_entry.as_ref()
    }

    pub fn pending_entry_mut(&mut self) -> Option<&mut NavigationEntry> {
        self.pending_entry.as_mut()
    }

    pub fn pending_entry_index(&self) -> Option<usize> {
        self.pending_entry_index
    }

    pub fn transient_entry(&self) -> Option<&NavigationEntry> {
        self.transient_entry.as_ref()
    }

    /// Transient, then pending, then last committed.
    pub fn active_entry(&self) -> Option<&NavigationEntry> {
        self.transient_entry
            .as_ref()
            .or(self.pending_entry.as_ref())
            .or_else(|| self.last_committed_entry())
    }

    pub fn max_restored_page_id(&self) -> i32 {
        self.max_restored_page_id
    }

    pub fn needs_reload(&self) -> bool {
        self.needs_reload
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn can_go_back(&self) -> bool {
        matches!(self.last_committed_index, Some(index) if index > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        matches!(self.last_committed_index, Some(index) if index + 1 < self.entries.len())
    }

    /// Index of the entry committed by `instance` with `page_id`.
    pub fn entry_index_with_page_id(&self, instance: &SiteInstance, page_id: i32) -> Option<usize> {
        self.entries
            .iter()
            .rposition(|entry| entry.page_id == page_id && entry.belongs_to(instance))
    }

    pub fn entry_with_page_id(&self, instance: &SiteInstance, page_id: i32) -> Option<&NavigationEntry> {
        self.entry_index_with_page_id(instance, page_id)
            .and_then(|index| self.entries.get(index))
    }

    pub fn entry_with_page_id_mut(
        &mut self,
        instance: &SiteInstance,
        page_id: i32,
    ) -> Option<&mut NavigationEntry> {
        match self.entry_index_with_page_id(instance, page_id) {
            Some(index) => self.entries.get_mut(index),
            None => None,
        }
    }

    // --- requests from the shell -----------------------------------------

    /// Starts a new navigation. Any previous uncommitted entries are replaced.
    pub fn load_url(
        &mut self,
        url: Url,
        referrer: Option<Url>,
        transition: PageTransition,
    ) -> &NavigationEntry {
        let entry = NavigationEntry::new(url, referrer, transition);
        self.load_entry(entry)
    }

    pub fn load_entry(&mut self, entry: NavigationEntry) -> &NavigationEntry {
        self.discard_non_committed_entries();
        self.load_pending_when_active = false;
        tracing::debug!(url = %entry.url, "Pending entry created");
        self.pending_entry.insert(entry)
    }

    /// Records a navigation to perform the next time the tab becomes active.
    pub fn load_url_lazily(
        &mut self,
        url: Url,
        referrer: Option<Url>,
        transition: PageTransition,
        title: String,
    ) {
        let mut entry = NavigationEntry::new(url, referrer, transition);
        entry.title = title;
        self.discard_non_committed_entries();
        self.pending_entry = Some(entry);
        self.load_pending_when_active = true;
    }

    pub fn loading_url_lazily(&self) -> bool {
        self.load_pending_when_active
    }

    /// Title shown for a lazily loaded tab.
    pub fn lazy_title(&self) -> Option<String> {
        if !self.load_pending_when_active {
            return None;
        }
        self.pending_entry
            .as_ref()
            .map(NavigationEntry::title_for_display)
    }

    pub fn go_back(&mut self) -> Result<&NavigationEntry> {
        self.go_to_offset(-1)
    }

    pub fn go_forward(&mut self) -> Result<&NavigationEntry> {
        self.go_to_offset(1)
    }

    pub fn go_to_offset(&mut self, offset: i32) -> Result<&NavigationEntry> {
        let index = self
            .index_for_offset(offset)
            .ok_or(NavigationError::OffsetOutOfRange {
                offset,
                count: self.entries.len(),
            })?;
        self.go_to_index(index)
    }

    pub fn go_to_index(&mut self, index: usize) -> Result<&NavigationEntry> {
        let mut entry = self
            .entries
            .get(index)
            .cloned()
            .ok_or(NavigationError::InvalidIndex(index))?;
        entry.transition = entry.transition.with(TransitionQualifiers::FORWARD_BACK);

        self.discard_non_committed_entries();
        self.pending_entry_index = Some(index);
        Ok(&*self.pending_entry.insert(entry))
    }

    pub fn reload(&mut self) -> Result<&NavigationEntry> {
        let index = self
            .last_committed_index
            .ok_or(NavigationError::NoCommittedEntry)?;
        let mut entry = self.entries[index].clone();
        entry.transition = PageTransition::new(TransitionType::Reload);

        self.discard_non_committed_entries();
        self.pending_entry_index = Some(index);
        Ok(&*self.pending_entry.insert(entry))
    }

    /// Assigns `instance` to a pending entry that has none yet (e.g. one
    /// restored from a previous session).
    pub fn set_pending_site_instance(&mut self, instance: &Arc<SiteInstance>) {
        if let Some(pending) = self.pending_entry.as_mut() {
            if pending.site_instance.is_none() {
                pending.site_instance = Some(Arc::clone(instance));
            }
        }
        if let Some(index) = self.pending_entry_index {
            if let Some(entry) = self.entries.get_mut(index) {
                if entry.site_instance.is_none() {
                    entry.site_instance = Some(Arc::clone(instance));
                }
            }
        }
    }

    pub fn set_transient_entry(&mut self, entry: NavigationEntry) {
        self.transient_entry = Some(entry);
    }

    pub fn discard_transient_entry(&mut self) {
        self.transient_entry = None;
    }

    pub fn discard_pending_entry(&mut self) {
        self.pending_entry = None;
        self.pending_entry_index = None;
    }

    pub fn discard_non_committed_entries(&mut self) {
        self.discard_pending_entry();
        self.discard_transient_entry();
    }

    // --- session restore and clone ---------------------------------------

    /// Replaces the list with restored entries. Restored entries carry page
    /// ids from a previous process, so they have no site instance and the
    /// selected entry is reloaded when the tab becomes active.
    pub fn restore(&mut self, mut entries: Vec<NavigationEntry>, selected: usize) -> Result<()> {
        if selected >= entries.len() {
            return Err(NavigationError::InvalidIndex(selected));
        }
        for entry in entries.iter_mut() {
            entry.site_instance = None;
        }

        self.discard_non_committed_entries();
        self.max_restored_page_id = entries
            .iter()
            .map(|entry| entry.page_id)
            .max()
            .unwrap_or(INVALID_PAGE_ID);
        self.entries = entries;
        self.last_committed_index = Some(selected);
        self.needs_reload = true;
        self.prune();
        tracing::info!(
            entries = self.entries.len(),
            max_restored_page_id = self.max_restored_page_id,
            "Navigation state restored"
        );
        Ok(())
    }

    /// Copies the committed list of `source`, as done when cloning a tab.
    pub fn copy_state_from(&mut self, source: &NavigationController) -> Result<()> {
        match source.last_committed_index {
            Some(selected) => self.restore(source.entries.clone(), selected),
            None => Ok(()),
        }
    }

    /// Returns the entry to navigate to if restored state still needs loading.
    pub fn load_if_necessary(&mut self) -> Option<NavigationEntry> {
        if self.load_pending_when_active {
            self.load_pending_when_active = false;
            return self.pending_entry.clone();
        }
        if !self.needs_reload {
            return None;
        }
        self.needs_reload = false;
        let index = self.last_committed_index?;
        let entry = self.entries.get(index)?.clone();
        self.pending_entry_index = Some(index);
        self.pending_entry = Some(entry.clone());
        Some(entry)
    }

    /// Marks the tab (in)active. Becoming active triggers any deferred load.
    pub fn set_active(&mut self, active: bool) -> Option<NavigationEntry> {
        self.active = active;
        if active {
            self.load_if_necessary()
        } else {
            None
        }
    }

    // --- commits from the content process --------------------------------

    /// Commits what `instance`'s content process reports. Returns `None` when
    /// nothing was committed.
    pub fn renderer_did_navigate(
        &mut self,
        params: &FrameNavigateParams,
        instance: &Arc<SiteInstance>,
    ) -> Option<LoadCommittedDetails> {
        let previous_url = self.last_committed_entry().map(|entry| entry.url.clone());
        let previous_entry_index = self.last_committed_index;
        let is_in_page = previous_url
            .as_ref()
            .is_some_and(|previous| is_in_page_navigation(previous, &params.url));
        let is_auto = params.transition.is_redirect() && self.pending_entry.is_none();

        let nav_type = self.classify_navigation(params, instance);
        if params.page_id > INVALID_PAGE_ID {
            instance.update_max_page_id(params.page_id);
        }

        let committed = match nav_type {
            NavigationType::NewPage => {
                self.did_navigate_to_new_page(params, instance);
                true
            }
            NavigationType::ExistingPage | NavigationType::SamePage | NavigationType::InPage => {
                self.did_navigate_to_existing_page(params, instance)
            }
            NavigationType::NewSubframe => self.did_navigate_new_subframe(params, instance),
            NavigationType::AutoSubframe => self.did_navigate_auto_subframe(params, instance),
            NavigationType::Ignore => false,
        };

        if !committed {
            tracing::debug!(
                url = %params.url,
                page_id = params.page_id,
                nav_type = ?nav_type,
                "Navigation not committed"
            );
            return None;
        }

        let entry = self.last_committed_entry()?.clone();
        Some(LoadCommittedDetails {
            entry,
            nav_type,
            is_main_frame: params.is_main_frame(),
            is_in_page,
            is_auto,
            previous_url,
            previous_entry_index,
        })
    }

    fn classify_navigation(
        &self,
        params: &FrameNavigateParams,
        instance: &Arc<SiteInstance>,
    ) -> NavigationType {
        if params.page_id == INVALID_PAGE_ID {
            // No document was produced (javascript: URLs and the like).
            return NavigationType::Ignore;
        }

        if params.page_id > instance.max_page_id() {
            return if params.is_main_frame() {
                NavigationType::NewPage
            } else {
                NavigationType::NewSubframe
            };
        }

        let Some(existing_index) = self.entry_index_with_page_id(instance, params.page_id) else {
            return NavigationType::Ignore;
        };

        if !params.is_main_frame() {
            return NavigationType::AutoSubframe;
        }

        if let Some(pending) = &self.pending_entry {
            if self.pending_entry_index.is_none()
                && pending.page_id == INVALID_PAGE_ID
                && pending.url == params.url
                && Some(existing_index) == self.last_committed_index
            {
                return NavigationType::SamePage;
            }
        }

        if is_in_page_navigation(&self.entries[existing_index].url, &params.url) {
            return NavigationType::InPage;
        }

        NavigationType::ExistingPage
    }

    fn did_navigate_to_new_page(&mut self, params: &FrameNavigateParams, instance: &Arc<SiteInstance>) {
        let mut entry = match self.pending_entry.take() {
            Some(pending) if self.pending_entry_index.is_none() => pending,
            _ => NavigationEntry::new(params.url.clone(), None, params.transition),
        };
        entry.url = params.url.clone();
        entry.referrer = params.referrer.clone();
        entry.transition = params.transition;
        entry.page_id = params.page_id;
        entry.has_post_data = params.is_post;
        entry.site_instance = Some(Arc::clone(instance));

        self.insert_entry(entry);
    }

    fn did_navigate_to_existing_page(
        &mut self,
        params: &FrameNavigateParams,
        instance: &Arc<SiteInstance>,
    ) -> bool {
        let Some(index) = self.entry_index_with_page_id(instance, params.page_id) else {
            return false;
        };
        let entry = &mut self.entries[index];
        entry.url = params.url.clone();
        entry.site_instance = Some(Arc::clone(instance));

        self.discard_non_committed_entries();
        self.last_committed_index = Some(index);
        true
    }

    fn did_navigate_new_subframe(&mut self, params: &FrameNavigateParams, instance: &Arc<SiteInstance>) -> bool {
        let Some(last) = self.last_committed_entry() else {
            tracing::warn!(url = %params.url, "Subframe navigation with no committed main frame");
            return false;
        };
        let mut entry = last.clone();
        entry.page_id = params.page_id;
        entry.transition = params.transition;
        entry.site_instance = Some(Arc::clone(instance));

        self.insert_entry(entry);
        true
    }

    fn did_navigate_auto_subframe(&mut self, params: &FrameNavigateParams, instance: &Arc<SiteInstance>) -> bool {
        match self.entry_index_with_page_id(instance, params.page_id) {
            // Going back to a page whose only difference is in a subframe.
            Some(index) if Some(index) != self.last_committed_index => {
                self.discard_non_committed_entries();
                self.last_committed_index = Some(index);
                true
            }
            _ => false,
        }
    }

    fn insert_entry(&mut self, entry: NavigationEntry) {
        self.discard_non_committed_entries();

        // Committing a new entry drops the forward list.
        let keep = self.last_committed_index.map_or(0, |index| index + 1);
        self.entries.truncate(keep);
        self.entries.push(entry);
        self.last_committed_index = Some(self.entries.len() - 1);
        self.prune();
    }

    fn prune(&mut self) {
        while self.entries.len() > self.max_entry_count {
            self.entries.remove(0);
            self.last_committed_index = self.last_committed_index.map(|index| index.saturating_sub(1));
        }
    }

    fn index_for_offset(&self, offset: i32) -> Option<usize> {
        let current = self.last_committed_index? as i64;
        let target = current + offset as i64;
        if target < 0 || target >= self.entries.len() as i64 {
            None
        } else {
            Some(target as usize)
        }
    }
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRY_COUNT)
    }
}

/// True if `to` differs from `from` only in its fragment.
pub fn is_in_page_navigation(from: &Url, to: &Url) -> bool {
    if to.fragment().is_none() {
        return false;
    }
    let mut a = from.clone();
    let mut b = to.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}
