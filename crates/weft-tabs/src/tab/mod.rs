//! Tab
//!
//! The logical state of one browsing context. A tab owns its navigation
//! controller and renderer manager, routes inbound endpoint events to them,
//! to the profile's auxiliary services and to the notification bus, and
//! exposes the command surface the shell drives.
//!
//! Everything here runs on the UI thread. Operations never block: they post a
//! message to an endpoint or a request to a service and continue when the
//! answering inbound event arrives.

mod commit;
mod dispatch;


use std::path::PathBuf;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use url::Url;

use weft_navigation::{
    Bitmap, NavigationController, NavigationEntry, PageTransition, SiteInstance,
    DEFAULT_MAX_ENTRY_COUNT, INVALID_PAGE_ID,
};
use weft_services::{
    is_savable_contents, pref_names, CancelToken, FileChooserRequest, FindResult, LoadDetails,
    Notification, NotificationDetails, NotificationKind, NotificationSource, ProcessServices,
    Profile, SaveRequest, TabId, OBSERVED_PREFS,
};

use crate::constrained::{ConstrainedWindow, ConstrainedWindowId};
use crate::delegate::{InvalidateFlags, TabDelegate};
use crate::dom_ui::DomUi;
use crate::endpoint::EndpointFactory;
use crate::error::TabError;
use crate::infobar::InfoBarDelegate;
use crate::manager::{RendererManager, Swap, ViewContext};
use crate::messages::{NavigateParams, OutboundMessage};
use crate::state::LoadState;
use crate::web_prefs::WebPreferences;
use crate::Result;

/// A dialog shown this soon after the previous one was dismissed offers to
/// suppress further dialogs.
const JAVASCRIPT_MESSAGE_EXPECTED_DELAY: Duration = Duration::from_millis(1000);

/// The download shelf stays up at least this long after a download starts.
const DOWNLOAD_SHELF_HIDE_DELAY: Duration = Duration::from_secs(5);

/// Find request ids are unique across tabs.
static FIND_REQUEST_ID_COUNTER: AtomicI32 = AtomicI32::new(0);

#[derive(Debug, Clone)]
pub struct TabSettings {
    /// Link-doctor page used for network errors. `None` disables it.
    pub alternate_error_page_base: Option<Url>,
    pub max_entry_count: usize,
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            alternate_error_page_base: None,
            max_entry_count: DEFAULT_MAX_ENTRY_COUNT,
        }
    }
}

/// Everything a tab is wired to. Cloned into tabs created from this one.
#[derive(Clone)]
pub struct TabContext {
    pub profile: Arc<Profile>,
    pub services: ProcessServices,
    pub factory: Arc<dyn EndpointFactory>,
    pub delegate: Option<Arc<dyn TabDelegate>>,
    pub settings: TabSettings,
}

/// A shortcut waiting for the page's application info.
struct PendingInstall {
    page_id: i32,
    url: Url,
    title: String,
    icon: Bitmap,
}

struct FindState {
    request_id: i32,
    text: String,
    case_sensitive: bool,
    aborted: bool,
    result: FindResult,
}

impl Default for FindState {
    fn default() -> Self {
        Self {
            request_id: -1,
            text: String::new(),
            case_sensitive: false,
            aborted: false,
            result: FindResult::default(),
        }
    }
}

pub struct Tab {
    id: TabId,
    context: TabContext,
    controller: NavigationController,
    manager: RendererManager,
    web_prefs: WebPreferences,

    is_loading: bool,
    waiting_for_response: bool,
    load_state: LoadState,
    load_state_host: String,
    current_load_start: Option<Instant>,

    contents_mime_type: String,
    encoding: String,
    /// Set once a page has written its title to history.
    received_page_title: bool,
    is_crashed: bool,
    is_starred: bool,
    notify_disconnection: bool,

    shelf_visible: bool,
    last_shelf_show: Option<Instant>,
    last_js_dismissal: Option<Instant>,
    suppress_js_messages: bool,

    pending_install: Option<PendingInstall>,
    install_cancel: Option<CancelToken>,
    save_cancel: Option<CancelToken>,
    file_chooser_cancel: Option<CancelToken>,
    find: FindState,

    infobars: Vec<Box<dyn InfoBarDelegate>>,
    child_windows: Vec<(ConstrainedWindowId, Box<dyn ConstrainedWindow>)>,
}

impl Tab {
    /// Creates a tab rendering in `site_instance`, or in a fresh instance.
    pub fn new(context: TabContext, site_instance: Option<Arc<SiteInstance>>) -> Result<Self> {
        let id = TabId::new();
        let site_instance = site_instance.unwrap_or_else(SiteInstance::create);
        let manager = RendererManager::new(
            id,
            Arc::clone(&context.factory),
            context.services.cross_site_requests.clone(),
            context.services.loader.clone(),
            site_instance,
        )?;
        let web_prefs = WebPreferences::from_prefs(&context.profile.prefs().read());
        let controller = NavigationController::new(context.settings.max_entry_count);

        tracing::info!(tab_id = %id, incognito = context.profile.is_incognito(), "Tab created");

        Ok(Self {
            id,
            context,
            controller,
            manager,
            web_prefs,
            is_loading: false,
            waiting_for_response: false,
            load_state: LoadState::Idle,
            load_state_host: String::new(),
            current_load_start: None,
            contents_mime_type: String::new(),
            encoding: String::new(),
            received_page_title: false,
            is_crashed: false,
            is_starred: false,
            notify_disconnection: false,
            shelf_visible: false,
            last_shelf_show: None,
            last_js_dismissal: None,
            suppress_js_messages: false,
            pending_install: None,
            install_cancel: None,
            save_cancel: None,
            file_chooser_cancel: None,
            find: FindState::default(),
            infobars: Vec::new(),
            child_windows: Vec::new(),
        })
    }

    /// A new tab with a copy of this tab's history, in its own process. The
    /// copy loads its selected entry when it is first selected.
    pub fn clone_tab(&self) -> Result<Tab> {
        let mut tab = Tab::new(self.context.clone(), Some(SiteInstance::create()))?;
        tab.controller.copy_state_from(&self.controller)?;
        tracing::info!(tab_id = %self.id, clone_id = %tab.id, "Tab cloned");
        Ok(tab)
    }

    // --- accessors -------------------------------------------------------

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn profile(&self) -> &Arc<Profile> {
        &self.context.profile
    }

    pub fn controller(&self) -> &NavigationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut NavigationController {
        &mut self.controller
    }

    pub fn manager(&self) -> &RendererManager {
        &self.manager
    }

    pub fn web_prefs(&self) -> &WebPreferences {
        &self.web_prefs
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn waiting_for_response(&self) -> bool {
        self.waiting_for_response
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn load_state_host(&self) -> &str {
        &self.load_state_host
    }

    pub fn contents_mime_type(&self) -> &str {
        &self.contents_mime_type
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn is_crashed(&self) -> bool {
        self.is_crashed
    }

    pub fn is_starred(&self) -> bool {
        self.is_starred
    }

    pub fn shelf_visible(&self) -> bool {
        self.shelf_visible
    }

    pub fn suppress_javascript_messages(&self) -> bool {
        self.suppress_js_messages
    }

    pub fn find_text(&self) -> &str {
        &self.find.text
    }

    pub fn find_result(&self) -> FindResult {
        self.find.result
    }

    pub fn current_find_request_id(&self) -> i32 {
        self.find.request_id
    }

    pub fn infobar_count(&self) -> usize {
        self.infobars.len()
    }

    pub fn infobar_message(&self, index: usize) -> Option<String> {
        self.infobars.get(index).map(|infobar| infobar.message())
    }

    pub fn constrained_window_count(&self) -> usize {
        self.child_windows.len()
    }

    /// The URL shown in the location bar.
    pub fn url(&self) -> Option<Url> {
        self.controller
            .active_entry()
            .map(|entry| entry.display_url().clone())
    }

    /// The active entry's icon, if one has been decided on.
    pub fn favicon(&self) -> Option<Bitmap> {
        self.controller
            .active_entry()
            .filter(|entry| entry.favicon.is_valid)
            .map(|entry| entry.favicon.bitmap.clone())
    }

    pub fn title(&self) -> String {
        let dom_ui = self
            .manager
            .pending_dom_ui()
            .or_else(|| self.manager.dom_ui());
        if let Some(dom_ui) = dom_ui {
            let view_source = self
                .controller
                .active_entry()
                .is_some_and(NavigationEntry::is_view_source_mode);
            if !view_source {
                if let Some(title) = dom_ui.overridden_title() {
                    return title.to_string();
                }
            }
        }

        if let Some(entry) = self.controller.transient_entry() {
            return entry.title_for_display();
        }
        if let Some(entry) = self.controller.last_committed_entry() {
            return entry.title_for_display();
        }
        self.controller.lazy_title().unwrap_or_default()
    }

    pub fn status_text(&self) -> String {
        if !self.is_loading {
            return String::new();
        }
        self.load_state.status_text(&self.load_state_host)
    }

    /// The DOM UI describing what the tab shows right now: the pending one
    /// while a navigation is pending, otherwise the committed one.
    fn dom_ui_for_current_state(&self) -> Option<&DomUi> {
        if self.controller.pending_entry().is_some() {
            return self.manager.pending_dom_ui();
        }
        self.manager.dom_ui()
    }

    pub fn should_display_url(&self) -> bool {
        if self
            .controller
            .active_entry()
            .is_some_and(NavigationEntry::is_view_source_mode)
        {
            return true;
        }
        self.dom_ui_for_current_state()
            .map_or(true, |dom_ui| !dom_ui.should_hide_url())
    }

    pub fn should_display_favicon(&self) -> bool {
        // Pending loads always show the throbber.
        if self.controller.last_committed_entry().is_some()
            && self.controller.pending_entry().is_some()
        {
            return true;
        }
        self.dom_ui_for_current_state()
            .map_or(true, |dom_ui| !dom_ui.hide_favicon())
    }

    pub fn is_bookmark_bar_always_visible(&self) -> bool {
        self.dom_ui_for_current_state()
            .is_some_and(DomUi::force_bookmark_bar_visible)
    }

    pub fn focus_location_bar_by_default(&self) -> bool {
        self.dom_ui_for_current_state()
            .is_some_and(DomUi::focus_location_bar_by_default)
    }

    /// True if `page_id` is the active entry of the current site instance.
    pub fn is_active_entry(&self, page_id: i32) -> bool {
        let current = self.manager.current().site_instance();
        self.controller
            .active_entry()
            .is_some_and(|entry| entry.belongs_to(current) && entry.page_id == page_id)
    }

    /// Link-doctor URL for network errors, with the user's first accept
    /// language. Disabled in incognito.
    pub fn alternate_error_page_url(&self) -> Option<Url> {
        if self.context.profile.is_incognito() {
            return None;
        }
        let prefs = self.context.profile.prefs().read();
        if !prefs.get_bool(pref_names::ALTERNATE_ERROR_PAGES_ENABLED) {
            return None;
        }

        let mut url = self.context.settings.alternate_error_page_base.clone()?;
        let languages = prefs.get_string(pref_names::ACCEPT_LANGUAGES);
        if let Some(language) = languages.split(',').map(str::trim).find(|l| !l.is_empty()) {
            url.query_pairs_mut().append_pair("hl", language);
        }
        Some(url)
    }

    // --- navigation ------------------------------------------------------

    pub fn load_url(&mut self, url: Url, referrer: Option<Url>, transition: PageTransition) -> Result<()> {
        tracing::info!(tab_id = %self.id, url = %url, "Loading URL");
        self.controller.load_url(url, referrer, transition);
        self.navigate_or_discard(false)
    }

    pub fn go_back(&mut self) -> Result<()> {
        self.controller.go_back()?;
        self.navigate_or_discard(false)
    }

    pub fn go_forward(&mut self) -> Result<()> {
        self.controller.go_forward()?;
        self.navigate_or_discard(false)
    }

    pub fn go_to_offset(&mut self, offset: i32) -> Result<()> {
        self.controller.go_to_offset(offset)?;
        self.navigate_or_discard(false)
    }

    pub fn go_to_index(&mut self, index: usize) -> Result<()> {
        self.controller.go_to_index(index)?;
        self.navigate_or_discard(false)
    }

    pub fn reload(&mut self) -> Result<()> {
        self.controller.reload()?;
        self.navigate_or_discard(true)
    }

    fn navigate_or_discard(&mut self, reload: bool) -> Result<()> {
        let result = self.navigate_to_pending_entry(reload);
        if !matches!(result, Ok(true)) {
            self.controller.discard_non_committed_entries();
        }
        if let Some(delegate) = &self.context.delegate {
            delegate.navigation_state_changed(self.id, InvalidateFlags::URL);
        }
        result.map(|_| ())
    }

    /// Sends the controller's pending entry to the endpoint that should load
    /// it. Returns false when the entry must not stay pending (a `javascript:`
    /// URL produces no history entry).
    pub fn navigate_to_pending_entry(&mut self, reload: bool) -> Result<bool> {
        let entry = self
            .controller
            .pending_entry()
            .cloned()
            .ok_or(TabError::NoPendingEntry)?;
        let last_committed = self.controller.last_committed_entry().cloned();
        let context = self.view_context();

        let outcome = self
            .manager
            .navigate(&entry, last_committed.as_ref(), &context);
        self.stop_loading_if_orphaned();
        let outcome = outcome?;
        if let Some(swap) = outcome.swap {
            self.did_swap(swap);
        }

        let Some(host) = self.manager.host_mut(outcome.endpoint) else {
            return Ok(false);
        };
        let instance = Arc::clone(host.site_instance());
        host.navigate(NavigateParams {
            page_id: entry.page_id,
            url: entry.url.clone(),
            referrer: entry.referrer.clone(),
            transition: entry.transition,
            content_state: entry.content_state.clone(),
            reload,
        });
        self.controller.set_pending_site_instance(&instance);
        self.current_load_start = Some(self.now());

        if entry.page_id == INVALID_PAGE_ID && entry.url.scheme() == "javascript" {
            return Ok(false);
        }

        if let Some(passwords) = &self.context.profile.services().password_manager {
            passwords.clear_provisional(self.id);
        }
        if reload {
            if let Some(history) = self.context.profile.history() {
                history.set_favicon_out_of_date(&entry.url);
            }
        }
        Ok(true)
    }

    fn view_context(&self) -> ViewContext {
        ViewContext {
            web_prefs: self.web_prefs.clone(),
            alternate_error_page_url: self.alternate_error_page_url(),
            max_restored_page_id: self.controller.max_restored_page_id(),
        }
    }

    // --- commands --------------------------------------------------------

    pub fn stop(&mut self) {
        self.manager.stop();
        if let Some(print) = &self.context.profile.services().print {
            print.stop(self.id);
        }
    }

    pub fn cut(&mut self) {
        self.manager.current_mut().send(OutboundMessage::Cut);
    }

    pub fn copy(&mut self) {
        self.manager.current_mut().send(OutboundMessage::Copy);
    }

    pub fn paste(&mut self) {
        self.manager.current_mut().send(OutboundMessage::Paste);
    }

    pub fn disassociate_from_popup_count(&mut self) {
        self.manager
            .current_mut()
            .send(OutboundMessage::DisassociateFromPopupCount);
    }

    pub fn popup_notification_visibility_changed(&mut self, visible: bool) {
        self.manager
            .current_mut()
            .send(OutboundMessage::PopupNotificationVisibilityChanged(visible));
    }

    pub fn set_initial_focus(&mut self, reverse: bool) {
        self.manager
            .current_mut()
            .send(OutboundMessage::SetInitialFocus { reverse });
    }

    /// Asks the current page whether it may close. The delegate is told to
    /// close the tab once the unload handler has run, or right away if there
    /// is no live page. Returns false in the latter case.
    pub fn close_requested(&mut self) -> bool {
        if self.manager.fire_close_before_unload() {
            return true;
        }
        if let Some(delegate) = &self.context.delegate {
            delegate.close_contents(self.id);
        }
        false
    }

    pub fn did_become_selected(&mut self) {
        if let Some(entry) = self.controller.set_active(true) {
            tracing::debug!(tab_id = %self.id, url = %entry.url, "Loading deferred entry");
            if let Err(e) = self.navigate_or_discard(false) {
                tracing::warn!(tab_id = %self.id, error = %e, "Deferred load failed");
            }
        }

        for (_, window) in self.child_windows.iter_mut() {
            window.did_become_selected();
        }
        if let Some(web_cache) = &self.context.services.web_cache {
            web_cache.observe_activity(self.manager.current().site_instance().process_id());
        }
    }

    pub fn was_hidden(&mut self) {
        for index in (0..self.child_windows.len()).rev() {
            self.child_windows[index].1.was_hidden();
        }
        self.notify(NotificationKind::TabContentsHidden);
    }

    pub fn show_contents(&mut self) {
        self.did_become_selected();
    }

    pub fn hide_contents(&mut self) {
        self.was_hidden();
    }

    pub fn set_download_shelf_visible(&mut self, visible: bool) {
        if self.shelf_visible == visible {
            return;
        }
        self.shelf_visible = visible;
        if let Some(delegate) = &self.context.delegate {
            delegate.contents_state_changed(self.id);
        }
    }

    /// A download started from this tab.
    pub fn on_start_download(&mut self) {
        self.set_download_shelf_visible(true);
        self.last_shelf_show = Some(self.now());
    }

    /// Requests the page's application info; the shortcut is installed when
    /// it arrives. A new request replaces any earlier one.
    pub fn create_shortcut(&mut self) -> Result<()> {
        let entry = self
            .controller
            .last_committed_entry()
            .ok_or(TabError::NoCommittedEntry)?;
        let page_id = entry.page_id;
        let icon = self.favicon().unwrap_or_default();
        if icon.is_empty() {
            return Err(TabError::ShortcutIconMissing);
        }
        let url = self.url().ok_or(TabError::NoCommittedEntry)?;

        if let Some(previous) = self.install_cancel.take() {
            previous.cancel();
        }
        let mut title = self.title();
        if title.is_empty() {
            title = url.to_string();
        }
        self.pending_install = Some(PendingInstall {
            page_id,
            url,
            title,
            icon,
        });
        self.install_cancel = Some(CancelToken::new());
        self.manager
            .current_mut()
            .send(OutboundMessage::GetApplicationInfo { page_id });
        Ok(())
    }

    /// Save-as. Pages that cannot be saved as HTML are downloaded instead.
    pub fn on_save_page(&mut self) {
        if !is_savable_contents(&self.contents_mime_type) {
            let (Some(downloads), Some(url)) = (&self.context.profile.services().downloads, self.url())
            else {
                return;
            };
            downloads.download_url(self.id, &url, None);
            return;
        }
        self.start_save(None, None);
    }

    /// Saves the page to `main_file` without prompting.
    pub fn save_page(&mut self, main_file: PathBuf, dir_path: PathBuf) -> bool {
        self.stop();
        self.start_save(Some(main_file), Some(dir_path))
    }

    fn start_save(&mut self, main_file: Option<PathBuf>, dir_path: Option<PathBuf>) -> bool {
        let Some(save_package) = self.context.profile.services().save_package.clone() else {
            return false;
        };
        let Some(page_url) = self.url() else {
            return false;
        };
        if let Some(previous) = self.save_cancel.take() {
            tracing::debug!(tab_id = %self.id, "Replacing an unfinished save");
            previous.cancel();
        }

        let cancel = CancelToken::new();
        self.save_cancel = Some(cancel.clone());
        save_package.save(SaveRequest {
            tab: self.id,
            page_url,
            title: self.title(),
            main_file,
            dir_path,
            cancel,
        });
        true
    }

    /// Interstitial pages cannot be printed.
    pub fn print_now(&mut self) -> bool {
        if self.controller.transient_entry().is_some() {
            return false;
        }
        let Some(print) = self.context.profile.services().print.clone() else {
            return false;
        };
        if !print.begin(self.id) {
            return false;
        }
        self.manager.current_mut().send(OutboundMessage::PrintPages)
    }

    // --- dialogs ---------------------------------------------------------

    pub fn on_javascript_message_box_closed(&mut self, reply_id: u64, success: bool, prompt: &str) {
        self.last_js_dismissal = Some(self.now());
        self.manager.current_mut().send(OutboundMessage::JsDialogReply {
            reply_id,
            success,
            prompt: prompt.to_string(),
        });
    }

    pub fn set_suppress_javascript_messages(&mut self, suppress: bool) {
        self.suppress_js_messages = suppress;
    }

    pub fn on_html_dialog_closed(&mut self, reply_id: u64, json_retval: &str) {
        self.manager.current_mut().send(OutboundMessage::HtmlDialogReply {
            reply_id,
            json_retval: json_retval.to_string(),
        });
    }

    pub fn file_selected(&mut self, path: PathBuf) {
        self.file_chooser_cancel = None;
        self.manager
            .current_mut()
            .send(OutboundMessage::FileSelected(path));
    }

    pub fn multi_files_selected(&mut self, paths: Vec<PathBuf>) {
        self.file_chooser_cancel = None;
        self.manager
            .current_mut()
            .send(OutboundMessage::MultiFilesSelected(paths));
    }

    /// Cancel is reported to the page as an empty selection.
    pub fn file_selection_canceled(&mut self) {
        self.multi_files_selected(Vec::new());
    }

    fn run_file_chooser(&mut self, multiple: bool, title: String, default_file: Option<PathBuf>) {
        let Some(dialogs) = self.context.profile.services().file_dialogs.clone() else {
            self.file_selection_canceled();
            return;
        };
        if let Some(previous) = self.file_chooser_cancel.take() {
            previous.cancel();
        }
        let cancel = CancelToken::new();
        self.file_chooser_cancel = Some(cancel.clone());
        dialogs.select_file(FileChooserRequest {
            tab: self.id,
            multiple,
            title,
            default_file,
            cancel,
        });
    }

    // --- find in page ----------------------------------------------------

    /// Starts or continues a find. An empty `search` repeats the previous
    /// search, falling back to the last search made in any tab.
    pub fn start_finding(&mut self, search: &str, forward: bool, case_sensitive: bool) -> bool {
        let mut search = search.to_string();
        if search.is_empty() && self.find.text.is_empty() {
            search = self.context.services.last_search.get();
            if search.is_empty() {
                return false;
            }
        }

        let find_next = (self.find.text == search || search.is_empty())
            && self.find.case_sensitive == case_sensitive
            && !self.find.aborted;
        if !find_next {
            self.find.result = FindResult::default();
        }

        self.find.request_id = FIND_REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst);
        if !search.is_empty() {
            self.find.text = search;
        }
        self.find.case_sensitive = case_sensitive;
        self.find.aborted = false;
        self.context.services.last_search.set(&self.find.text);

        self.manager.current_mut().send(OutboundMessage::Find {
            request_id: self.find.request_id,
            search_text: self.find.text.clone(),
            forward,
            match_case: case_sensitive,
            find_next,
        })
    }

    pub fn stop_finding(&mut self, clear_selection: bool) {
        if clear_selection {
            self.find.text.clear();
        }
        self.find.aborted = true;
        self.find.result = FindResult::default();
        self.manager
            .current_mut()
            .send(OutboundMessage::StopFinding { clear_selection });
    }

    // --- infobars and constrained windows --------------------------------

    /// Adds `infobar` unless an equal one is already showing.
    pub fn add_info_bar(&mut self, mut infobar: Box<dyn InfoBarDelegate>) -> bool {
        if self
            .infobars
            .iter()
            .any(|existing| existing.equals(infobar.as_ref()))
        {
            infobar.info_bar_closed();
            return false;
        }
        tracing::debug!(tab_id = %self.id, message = %infobar.message(), "Infobar added");
        self.infobars.push(infobar);
        true
    }

    pub fn remove_info_bar(&mut self, index: usize) -> bool {
        if index >= self.infobars.len() {
            return false;
        }
        let mut infobar = self.infobars.remove(index);
        infobar.info_bar_closed();
        true
    }

    pub fn add_constrained_window(&mut self, window: Box<dyn ConstrainedWindow>) -> ConstrainedWindowId {
        let id = ConstrainedWindowId::next();
        self.child_windows.push((id, window));
        id
    }

    pub fn close_constrained_window(&mut self, id: ConstrainedWindowId) -> bool {
        let Some(index) = self.child_windows.iter().position(|(window_id, _)| *window_id == id) else {
            return false;
        };
        let (_, mut window) = self.child_windows.remove(index);
        window.close();
        true
    }

    /// Closes every child window, newest first.
    fn close_constrained_windows(&mut self) {
        while let Some((_, mut window)) = self.child_windows.pop() {
            window.close();
        }
    }

    // --- observation -----------------------------------------------------

    /// A preference changed. Returns false if the tab does not observe it.
    pub fn pref_changed(&mut self, name: &str) -> bool {
        if !OBSERVED_PREFS.contains(&name) {
            return false;
        }
        self.web_prefs = WebPreferences::from_prefs(&self.context.profile.prefs().read());
        let web_prefs = if self.manager.dom_ui().is_some() {
            self.web_prefs.clone().for_dom_ui()
        } else {
            self.web_prefs.clone()
        };
        self.manager
            .current_mut()
            .send(OutboundMessage::UpdateWebPreferences(web_prefs));

        if name == pref_names::ALTERNATE_ERROR_PAGES_ENABLED {
            let url = self.alternate_error_page_url();
            self.manager
                .current_mut()
                .send(OutboundMessage::SetAlternateErrorPageUrl(url));
        }
        true
    }

    /// Bookmark changes from this tab's profile refresh the starred state.
    pub fn observe(&mut self, notification: &Notification) {
        match notification.kind {
            NotificationKind::UrlsStarred | NotificationKind::BookmarkModelLoaded => {
                if let NotificationSource::Profile(profile) = notification.source {
                    if self.context.profile.same_profile(profile) {
                        self.update_starred_state_for_current_url();
                    }
                }
            }
            _ => {}
        }
    }

    // --- internal state transitions ---------------------------------------

    fn now(&self) -> Instant {
        self.context.services.clock.now()
    }

    fn notify(&self, kind: NotificationKind) {
        self.notify_with(kind, NotificationDetails::None);
    }

    fn notify_with(&self, kind: NotificationKind, details: NotificationDetails) {
        self.context
            .services
            .bus
            .notify(Notification::from_tab(kind, self.id).with_details(details));
    }

    fn set_is_loading(&mut self, is_loading: bool, details: Option<LoadDetails>) {
        if is_loading == self.is_loading {
            return;
        }
        if !is_loading {
            self.load_state = LoadState::Idle;
            self.load_state_host.clear();
            self.manager.clear_loading();
        }
        self.is_loading = is_loading;
        self.waiting_for_response = is_loading;

        if let Some(delegate) = &self.context.delegate {
            delegate.loading_state_changed(self.id);
        }
        let kind = if is_loading {
            NotificationKind::LoadStart
        } else {
            NotificationKind::LoadStop
        };
        let details = details.map_or(NotificationDetails::None, NotificationDetails::Load);
        tracing::debug!(tab_id = %self.id, is_loading, "Loading state changed");
        self.notify_with(kind, details);
    }

    /// Ends the tab's load when every endpoint that reported one has been
    /// torn down before it could report the stop.
    fn stop_loading_if_orphaned(&mut self) {
        if self.is_loading && !self.manager.has_load_in_progress() {
            tracing::debug!(tab_id = %self.id, "Loading endpoint went away");
            self.set_is_loading(false, None);
        }
    }

    fn set_not_waiting_for_response(&mut self) {
        if !self.waiting_for_response {
            return;
        }
        self.waiting_for_response = false;
        if let Some(delegate) = &self.context.delegate {
            delegate.loading_state_changed(self.id);
        }
    }

    fn set_is_crashed(&mut self, crashed: bool) {
        if self.is_crashed == crashed {
            return;
        }
        self.is_crashed = crashed;
        if let Some(delegate) = &self.context.delegate {
            delegate.contents_state_changed(self.id);
        }
    }

    fn notify_connected(&mut self) {
        self.notify_disconnection = true;
        self.notify(NotificationKind::TabContentsConnected);
    }

    fn notify_disconnected(&mut self) {
        if !self.notify_disconnection {
            return;
        }
        self.notify_disconnection = false;
        self.notify(NotificationKind::TabContentsDisconnected);
    }

    fn did_swap(&mut self, swap: Swap) {
        self.notify(NotificationKind::TabContentsSwapped);
        if let Some(devtools) = &self.context.services.devtools {
            devtools.attach_to_agent(self.id, swap.new);
        }
        if swap.new_is_live {
            self.notify_connected();
        } else {
            // The new endpoint died while it was pending and its gone event
            // was ignored then.
            self.current_endpoint_gone();
        }
        self.stop_loading_if_orphaned();
    }

    fn current_endpoint_gone(&mut self) {
        self.set_is_loading(false, None);
        self.notify_disconnected();
        self.set_is_crashed(true);
        if let Some(delegate) = &self.context.delegate {
            delegate.navigation_state_changed(self.id, InvalidateFlags::all());
        }
        self.context.services.hung_renderer_ui.hide_for_tab(self.id);
    }

    fn update_starred_state_for_current_url(&mut self) {
        let starred = match (&self.context.profile.services().bookmarks, self.url()) {
            (Some(bookmarks), Some(url)) => bookmarks.is_loaded() && bookmarks.is_bookmarked(&url),
            _ => false,
        };
        if starred == self.is_starred {
            return;
        }
        self.is_starred = starred;
        if let Some(delegate) = &self.context.delegate {
            delegate.url_starred_changed(self.id, starred);
        }
    }
}

impl Drop for Tab {
    fn drop(&mut self) {
        self.close_constrained_windows();
        while let Some(mut infobar) = self.infobars.pop() {
            infobar.info_bar_closed();
        }

        self.notify(NotificationKind::TabContentsDestroyed);

        if let Some(install) = self.install_cancel.take() {
            install.cancel();
        }
        if let Some(save) = self.save_cancel.take() {
            save.cancel();
        }
        if let Some(chooser) = self.file_chooser_cancel.take() {
            chooser.cancel();
        }
        if let Some(print) = &self.context.profile.services().print {
            print.stop(self.id);
        }

        self.notify_disconnected();
        self.context.services.hung_renderer_ui.hide_for_tab(self.id);
        self.manager.shutdown();
        tracing::info!(tab_id = %self.id, "Tab destroyed");
    }
}
