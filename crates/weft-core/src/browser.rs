//! Main browser state container
//!
//! The browser owns every tab. Content processes never touch a tab directly:
//! they post [`RoutedEvent`]s into the browser's channel, and the browser
//! hands each one to its tab on the thread that owns the tabs.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use url::Url;

use weft_navigation::{PageTransition, TransitionType};
use weft_services::{
    BookmarkService, EndpointId, HistoryService, Notification, NotificationDetails,
    NotificationKind, NotificationSource, PrefService, PrefValue, ProcessServices, Profile,
    ProfileServices, Rect, ShutdownSignal, TabId,
};
use weft_storage::{Database, HistoryStore};
use weft_tabs::{
    EndpointFactory, HtmlDialogRequest, InboundEvent, InvalidateFlags, Tab, TabContext,
    TabDelegate, WindowOpenDisposition,
};

use crate::bookmarks::{Bookmark, BookmarkStore};
use crate::config::Config;
use crate::error::CoreError;
use crate::history::SqliteHistory;
use crate::Result;

const PREF_KEY_PREFIX: &str = "pref.";

/// An inbound event addressed to one endpoint of one tab.
#[derive(Debug, Clone)]
pub struct RoutedEvent {
    pub tab: TabId,
    pub endpoint: EndpointId,
    pub event: InboundEvent,
}

/// Sits between the tabs and the embedder's delegate. Close requests are
/// queued here and carried out once the tab has returned control.
struct ShellDelegate {
    inner: Option<Arc<dyn TabDelegate>>,
    closing: Mutex<Vec<TabId>>,
}

impl ShellDelegate {
    fn take_closing(&self) -> Vec<TabId> {
        std::mem::take(&mut *self.closing.lock())
    }
}

impl TabDelegate for ShellDelegate {
    fn open_url(
        &self,
        source: TabId,
        url: &Url,
        referrer: Option<&Url>,
        disposition: WindowOpenDisposition,
        transition: PageTransition,
    ) {
        if let Some(inner) = &self.inner {
            inner.open_url(source, url, referrer, disposition, transition);
        }
    }

    fn navigation_state_changed(&self, tab: TabId, changed: InvalidateFlags) {
        if let Some(inner) = &self.inner {
            inner.navigation_state_changed(tab, changed);
        }
    }

    fn loading_state_changed(&self, tab: TabId) {
        if let Some(inner) = &self.inner {
            inner.loading_state_changed(tab);
        }
    }

    fn contents_state_changed(&self, tab: TabId) {
        if let Some(inner) = &self.inner {
            inner.contents_state_changed(tab);
        }
    }

    fn url_starred_changed(&self, tab: TabId, starred: bool) {
        if let Some(inner) = &self.inner {
            inner.url_starred_changed(tab, starred);
        }
    }

    fn close_contents(&self, tab: TabId) {
        tracing::debug!(tab_id = %tab, "Tab asked to close");
        self.closing.lock().push(tab);
        if let Some(inner) = &self.inner {
            inner.close_contents(tab);
        }
    }

    fn move_contents(&self, tab: TabId, rect: Rect) {
        if let Some(inner) = &self.inner {
            inner.move_contents(tab, rect);
        }
    }

    fn is_popup(&self, tab: TabId) -> bool {
        self.inner.as_ref().is_some_and(|inner| inner.is_popup(tab))
    }

    fn has_constraining_contents(&self, tab: TabId) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.has_constraining_contents(tab))
    }

    fn update_target_url(&self, tab: TabId, url: Option<&Url>) {
        if let Some(inner) = &self.inner {
            inner.update_target_url(tab, url);
        }
    }

    fn show_html_dialog(&self, request: HtmlDialogRequest) {
        if let Some(inner) = &self.inner {
            inner.show_html_dialog(request);
        }
    }

    fn before_unload_fired(&self, tab: TabId, proceed: bool) -> bool {
        match &self.inner {
            Some(inner) => inner.before_unload_fired(tab, proceed),
            None => proceed,
        }
    }
}

pub struct Browser {
    config: Config,
    db: Database,
    profile: Arc<Profile>,
    services: ProcessServices,
    factory: Arc<dyn EndpointFactory>,
    delegate: Arc<ShellDelegate>,
    bookmarks: Arc<BookmarkStore>,
    history: Arc<SqliteHistory>,
    tabs: HashMap<TabId, Tab>,
    tab_order: Vec<TabId>,
    active_tab: Option<TabId>,
    events_tx: mpsc::UnboundedSender<RoutedEvent>,
    events_rx: mpsc::UnboundedReceiver<RoutedEvent>,
}

impl Browser {
    /// Opens (or creates) the database named by `config` and builds the
    /// browser around it.
    pub fn new(
        config: Config,
        factory: Arc<dyn EndpointFactory>,
        delegate: Option<Arc<dyn TabDelegate>>,
    ) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db, factory, delegate)
    }

    pub fn with_database(
        config: Config,
        db: Database,
        factory: Arc<dyn EndpointFactory>,
        delegate: Option<Arc<dyn TabDelegate>>,
    ) -> Result<Self> {
        let mut prefs = PrefService::with_browser_defaults();
        prefs.load_user_values(load_stored_prefs(&db)?);

        let bookmarks = Arc::new(BookmarkStore::load(db.clone())?);
        let history = Arc::new(SqliteHistory::new(db.clone()));
        let profile_services = ProfileServices {
            history: Some(history.clone() as Arc<dyn HistoryService>),
            bookmarks: Some(bookmarks.clone() as Arc<dyn BookmarkService>),
            ..ProfileServices::default()
        };
        let profile = Profile::new(prefs, profile_services);
        let profile = if config.incognito {
            profile.incognito()
        } else {
            profile
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        tracing::info!(incognito = config.incognito, "Browser initialized");

        Ok(Self {
            config,
            db,
            profile: Arc::new(profile),
            services: ProcessServices::new(),
            factory,
            delegate: Arc::new(ShellDelegate {
                inner: delegate,
                closing: Mutex::new(Vec::new()),
            }),
            bookmarks,
            history,
            tabs: HashMap::new(),
            tab_order: Vec::new(),
            active_tab: None,
            events_tx,
            events_rx,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn profile(&self) -> &Arc<Profile> {
        &self.profile
    }

    pub fn services(&self) -> &ProcessServices {
        &self.services
    }

    pub fn history(&self) -> &HistoryStore {
        self.history.store()
    }

    // === Tabs ===

    /// Opens a tab, loading `url` if given. The first tab becomes active.
    pub fn create_tab(&mut self, url: Option<Url>) -> Result<TabId> {
        let context = TabContext {
            profile: Arc::clone(&self.profile),
            services: self.services.clone(),
            factory: Arc::clone(&self.factory),
            delegate: Some(self.delegate.clone() as Arc<dyn TabDelegate>),
            settings: self.config.tab_settings(),
        };
        let mut tab = Tab::new(context, None)?;
        let id = tab.id();
        if let Some(url) = url {
            tab.load_url(url, None, PageTransition::new(TransitionType::Typed))?;
        }
        self.tabs.insert(id, tab);
        self.tab_order.push(id);

        if self.active_tab.is_none() {
            self.activate_tab(id)?;
        }
        self.reap_closed_tabs();
        Ok(id)
    }

    pub fn navigate_tab(&mut self, id: TabId, url: Url) -> Result<()> {
        let tab = self.tabs.get_mut(&id).ok_or(CoreError::TabNotFound(id))?;
        tab.load_url(url, None, PageTransition::new(TransitionType::Typed))?;
        self.reap_closed_tabs();
        Ok(())
    }

    /// Starts the tab's close handshake. The tab is removed once its page
    /// agrees to close, which is immediately if it has no live view.
    pub fn close_tab(&mut self, id: TabId) -> Result<()> {
        let tab = self.tabs.get_mut(&id).ok_or(CoreError::TabNotFound(id))?;
        if tab.close_requested() {
            tracing::debug!(tab_id = %id, "Waiting for unload handlers");
        }
        self.reap_closed_tabs();
        Ok(())
    }

    pub fn activate_tab(&mut self, id: TabId) -> Result<()> {
        if !self.tabs.contains_key(&id) {
            return Err(CoreError::TabNotFound(id));
        }
        if self.active_tab == Some(id) {
            return Ok(());
        }
        if let Some(previous) = self.active_tab.and_then(|prev| self.tabs.get_mut(&prev)) {
            previous.was_hidden();
        }
        self.active_tab = Some(id);
        if let Some(tab) = self.tabs.get_mut(&id) {
            tab.did_become_selected();
        }
        tracing::debug!(tab_id = %id, "Tab activated");
        self.reap_closed_tabs();
        Ok(())
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.active_tab
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.get(&id)
    }

    pub fn tab_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.get_mut(&id)
    }

    /// Tab ids in the order they were opened.
    pub fn tab_ids(&self) -> &[TabId] {
        &self.tab_order
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    fn reap_closed_tabs(&mut self) {
        for id in self.delegate.take_closing() {
            self.remove_tab(id);
        }
    }

    fn remove_tab(&mut self, id: TabId) {
        let Some(position) = self.tab_order.iter().position(|t| *t == id) else {
            return;
        };
        self.tab_order.remove(position);
        let tab = self.tabs.remove(&id);

        if self.active_tab == Some(id) {
            self.active_tab = None;
            let next = self
                .tab_order
                .get(position)
                .or_else(|| self.tab_order.last())
                .copied();
            if let Some(next) = next {
                self.active_tab = Some(next);
                if let Some(tab) = self.tabs.get_mut(&next) {
                    tab.did_become_selected();
                }
            }
        }

        drop(tab);
        tracing::info!(tab_id = %id, remaining = self.tab_order.len(), "Tab closed");
    }

    // === Event routing ===

    /// A sender content-process transports use to reach the tabs.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<RoutedEvent> {
        self.events_tx.clone()
    }

    pub fn dispatch(&mut self, routed: RoutedEvent) {
        match self.tabs.get_mut(&routed.tab) {
            Some(tab) => tab.handle_event(routed.endpoint, routed.event),
            None => {
                tracing::debug!(
                    tab_id = %routed.tab,
                    endpoint = %routed.endpoint,
                    "Dropping event for a closed tab"
                );
            }
        }
        self.reap_closed_tabs();
    }

    /// Handles every queued event without waiting. Returns how many there
    /// were.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(routed) = self.events_rx.try_recv() {
            self.dispatch(routed);
            handled += 1;
        }
        handled
    }

    /// Handles events as they arrive until shutdown is signalled, then
    /// closes every tab.
    pub async fn run(&mut self) {
        let shutdown = ShutdownSignal::wait(self.services.shutdown.subscribe());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                routed = self.events_rx.recv() => match routed {
                    Some(routed) => self.dispatch(routed),
                    None => break,
                },
            }
        }
        self.shutdown();
    }

    /// Destroys every tab and tears down the process services.
    pub fn shutdown(&mut self) {
        self.active_tab = None;
        for id in std::mem::take(&mut self.tab_order) {
            drop(self.tabs.remove(&id));
        }
        self.services.teardown();
        tracing::info!("Browser shut down");
    }

    // === Preferences ===

    /// Stores a preference and pushes it to every tab. Returns whether the
    /// effective value changed.
    pub fn set_pref(&mut self, name: &str, value: impl Into<PrefValue>) -> Result<bool> {
        let stored = {
            let mut prefs = self.profile.prefs().write();
            if !prefs.set(name, value)? {
                return Ok(false);
            }
            let stored = prefs
                .user_values()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone());
            stored
        };

        let key = format!("{PREF_KEY_PREFIX}{name}");
        match stored {
            Some(value) => self.db.set_setting(&key, &serde_json::to_string(&value)?)?,
            None => self.db.delete_setting(&key)?,
        }
        tracing::info!(pref = %name, "Preference changed");

        for id in &self.tab_order {
            if let Some(tab) = self.tabs.get_mut(id) {
                tab.pref_changed(name);
            }
        }
        Ok(true)
    }

    // === Bookmarks ===

    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.bookmarks.all()
    }

    pub fn add_bookmark(&mut self, url: Url, title: &str, folder: Option<String>) -> Result<()> {
        self.bookmarks.add(url.clone(), title, folder)?;
        self.notify_starred(vec![url], true);
        Ok(())
    }

    pub fn remove_bookmark(&mut self, url: &Url) -> Result<bool> {
        if !self.bookmarks.remove(url)? {
            return Ok(false);
        }
        self.notify_starred(vec![url.clone()], false);
        Ok(true)
    }

    fn notify_starred(&mut self, urls: Vec<Url>, starred: bool) {
        let notification = Notification::new(
            NotificationKind::UrlsStarred,
            NotificationSource::Profile(self.profile.id()),
        )
        .with_details(NotificationDetails::Starred { urls, starred });

        self.services.bus.notify(notification.clone());
        for tab in self.tabs.values_mut() {
            tab.observe(&notification);
        }
    }
}

fn load_stored_prefs(db: &Database) -> Result<Vec<(String, PrefValue)>> {
    let mut values = Vec::new();
    for (name, json) in db.settings_with_prefix(PREF_KEY_PREFIX)? {
        match serde_json::from_str(&json) {
            Ok(value) => values.push((name, value)),
            Err(e) => tracing::warn!(pref = %name, error = %e, "Ignoring unreadable preference"),
        }
    }
    Ok(values)
}
