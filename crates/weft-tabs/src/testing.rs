//! Test doubles shared by the unit tests in this crate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;

use weft_navigation::{
    AutofillForm, Bitmap, FrameNavigateParams, PageTransition, PasswordForm, SiteInstance,
    TransitionType,
};
use weft_services::{
    AddPageRequest, AutofillManager, BookmarkService, CancelToken, DownloadService, EndpointId,
    FaviconService, FileChooserRequest, FileDialogService, GlobalRequestId, HistoryService,
    HungRendererTracker, JsDialogPresenter, JsDialogRequest, KeywordFetcher, KeywordModel,
    ManualClock, Notification, NotificationKind, PasswordManager, PrefService, PrintService,
    ProcessServices, Profile, ProfileServices, ResourceLoader, SavePackageService, SaveRequest,
    ShortcutInstaller, ShortcutRequest, TabId, TemplateUrl, ThumbnailScore,
};

use crate::delegate::{HtmlDialogRequest, InvalidateFlags, TabDelegate};
use crate::endpoint::{CreateViewParams, EndpointFactory, ProcessEndpoint};
use crate::messages::{InboundEvent, OutboundMessage, WindowOpenDisposition};
use crate::tab::{Tab, TabContext, TabSettings};

pub(crate) fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

// --- endpoints -----------------------------------------------------------

#[derive(Default)]
struct EndpointLog {
    sent: HashMap<EndpointId, Vec<OutboundMessage>>,
    live: HashSet<EndpointId>,
    shut_down: HashSet<EndpointId>,
    created: Vec<EndpointId>,
    views: Vec<(EndpointId, CreateViewParams)>,
}

struct FakeEndpoint {
    id: EndpointId,
    site_instance: Arc<SiteInstance>,
    log: Arc<Mutex<EndpointLog>>,
    fail_views: Arc<AtomicBool>,
}

impl ProcessEndpoint for FakeEndpoint {
    fn id(&self) -> EndpointId {
        self.id
    }

    fn site_instance(&self) -> &Arc<SiteInstance> {
        &self.site_instance
    }

    fn create_view(&mut self, params: &CreateViewParams) -> bool {
        if self.fail_views.load(Ordering::SeqCst) {
            return false;
        }
        let mut log = self.log.lock();
        log.live.insert(self.id);
        log.views.push((self.id, params.clone()));
        true
    }

    fn is_live(&self) -> bool {
        self.log.lock().live.contains(&self.id)
    }

    fn send(&mut self, message: OutboundMessage) -> bool {
        self.log.lock().sent.entry(self.id).or_default().push(message);
        true
    }

    fn shutdown(&mut self) {
        let mut log = self.log.lock();
        log.live.remove(&self.id);
        log.shut_down.insert(self.id);
    }
}

/// Hands out in-memory endpoints and records everything sent to them.
#[derive(Default)]
pub(crate) struct FakeFactory {
    log: Arc<Mutex<EndpointLog>>,
    next_routing_id: AtomicU32,
    fail_create: AtomicBool,
    /// Shared with every endpoint, so it also affects endpoints created
    /// before it was set.
    fail_views: Arc<AtomicBool>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_views(&self, fail: bool) {
        self.fail_views.store(fail, Ordering::SeqCst);
    }

    /// Simulates the content process dying.
    pub fn kill(&self, endpoint: EndpointId) {
        self.log.lock().live.remove(&endpoint);
    }

    pub fn sent(&self, endpoint: EndpointId) -> Vec<OutboundMessage> {
        self.log.lock().sent.get(&endpoint).cloned().unwrap_or_default()
    }

    pub fn clear_sent(&self) {
        self.log.lock().sent.clear();
    }

    pub fn is_shut_down(&self, endpoint: EndpointId) -> bool {
        self.log.lock().shut_down.contains(&endpoint)
    }

    pub fn created(&self) -> Vec<EndpointId> {
        self.log.lock().created.clone()
    }

    pub fn views(&self) -> Vec<(EndpointId, CreateViewParams)> {
        self.log.lock().views.clone()
    }

    /// The navigations `endpoint` was asked to perform.
    pub fn navigations(&self, endpoint: EndpointId) -> Vec<Url> {
        self.sent(endpoint)
            .into_iter()
            .filter_map(|message| match message {
                OutboundMessage::NavigateToEntry(params) => Some(params.url),
                _ => None,
            })
            .collect()
    }
}

impl EndpointFactory for FakeFactory {
    fn create_endpoint(
        &self,
        _tab: TabId,
        site_instance: &Arc<SiteInstance>,
    ) -> Option<Box<dyn ProcessEndpoint>> {
        if self.fail_create.load(Ordering::SeqCst) {
            return None;
        }
        let routing_id = self.next_routing_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = EndpointId::new(site_instance.process_id(), routing_id);
        self.log.lock().created.push(id);
        Some(Box::new(FakeEndpoint {
            id,
            site_instance: Arc::clone(site_instance),
            log: Arc::clone(&self.log),
            fail_views: Arc::clone(&self.fail_views),
        }))
    }
}

#[derive(Default)]
pub(crate) struct RecordingLoader {
    resumed: Mutex<Vec<GlobalRequestId>>,
}

impl RecordingLoader {
    pub fn resumed(&self) -> Vec<GlobalRequestId> {
        self.resumed.lock().clone()
    }
}

impl ResourceLoader for RecordingLoader {
    fn resume_paused_response(&self, request: GlobalRequestId) {
        self.resumed.lock().push(request);
    }
}

// --- delegate ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DelegateCall {
    OpenUrl {
        url: Url,
        disposition: WindowOpenDisposition,
        transition: PageTransition,
    },
    NavigationStateChanged(InvalidateFlags),
    LoadingStateChanged,
    ContentsStateChanged,
    UrlStarredChanged(bool),
    CloseContents,
    MoveContents,
    UpdateTargetUrl(Option<Url>),
    ShowHtmlDialog(u64),
    BeforeUnloadFired(bool),
}

#[derive(Default)]
pub(crate) struct RecordingDelegate {
    calls: Mutex<Vec<DelegateCall>>,
    pub popup: AtomicBool,
    pub constraining: AtomicBool,
    /// Overrides the answer to `before_unload_fired`.
    pub before_unload_answer: Mutex<Option<bool>>,
}

impl RecordingDelegate {
    pub fn calls(&self) -> Vec<DelegateCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &DelegateCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: DelegateCall) {
        self.calls.lock().push(call);
    }
}

impl TabDelegate for RecordingDelegate {
    fn open_url(
        &self,
        _source: TabId,
        url: &Url,
        _referrer: Option<&Url>,
        disposition: WindowOpenDisposition,
        transition: PageTransition,
    ) {
        self.record(DelegateCall::OpenUrl {
            url: url.clone(),
            disposition,
            transition,
        });
    }

    fn navigation_state_changed(&self, _tab: TabId, changed: InvalidateFlags) {
        self.record(DelegateCall::NavigationStateChanged(changed));
    }

    fn loading_state_changed(&self, _tab: TabId) {
        self.record(DelegateCall::LoadingStateChanged);
    }

    fn contents_state_changed(&self, _tab: TabId) {
        self.record(DelegateCall::ContentsStateChanged);
    }

    fn url_starred_changed(&self, _tab: TabId, starred: bool) {
        self.record(DelegateCall::UrlStarredChanged(starred));
    }

    fn close_contents(&self, _tab: TabId) {
        self.record(DelegateCall::CloseContents);
    }

    fn move_contents(&self, _tab: TabId, _rect: weft_services::Rect) {
        self.record(DelegateCall::MoveContents);
    }

    fn is_popup(&self, _tab: TabId) -> bool {
        self.popup.load(Ordering::SeqCst)
    }

    fn has_constraining_contents(&self, _tab: TabId) -> bool {
        self.constraining.load(Ordering::SeqCst)
    }

    fn update_target_url(&self, _tab: TabId, url: Option<&Url>) {
        self.record(DelegateCall::UpdateTargetUrl(url.cloned()));
    }

    fn show_html_dialog(&self, request: HtmlDialogRequest) {
        self.record(DelegateCall::ShowHtmlDialog(request.reply_id));
    }

    fn before_unload_fired(&self, _tab: TabId, proceed: bool) -> bool {
        self.record(DelegateCall::BeforeUnloadFired(proceed));
        self.before_unload_answer.lock().unwrap_or(proceed)
    }
}

// --- auxiliary services ---------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ServiceCall {
    FormsSeen(usize),
    ProvisionallySave(Url),
    ClearProvisional,
    PasswordDidNavigate,
    PasswordDidStopLoading,
    AutofillSubmitted,
    RemoveAutofill(String, String),
    FaviconFetch(Url),
    FaviconSetUrl(Url),
    FaviconSetIcon(i32),
    FaviconFailed(i32),
    KeywordLoad,
    KeywordAdd(TemplateUrl),
    KeywordRemove(String),
    ScheduleDownload {
        keyword: String,
        osdd: Url,
        favicon: Option<Url>,
        autodetected: bool,
    },
    AddPage(AddPageRequest),
    SetPageTitle(Url, String),
    SetThumbnail(Url),
    FaviconOutOfDate(Url),
    DownloadUrl(Url),
    Save(Url),
    PrintBegin,
    PrintStop,
    PrintedPagesCount(i32),
    PrintedPage(i32),
    InstallShortcut { url: Url, title: String },
    SelectFile { multiple: bool },
    ShowJsDialog(JsDialogRequest),
}

/// One object playing every auxiliary service, recording each call.
pub(crate) struct FakeServices {
    calls: Mutex<Vec<ServiceCall>>,
    pub keyword_loaded: AtomicBool,
    pub can_replace_keyword: AtomicBool,
    pub templates: Mutex<HashMap<String, TemplateUrl>>,
    pub downloads_in_progress: AtomicUsize,
    pub bookmarked: Mutex<HashSet<Url>>,
    pub print_available: AtomicBool,
    /// When set, the print subsystem claims dying endpoints.
    pub print_owns_gone: AtomicBool,
    pub autofill_suggestions: Mutex<Vec<String>>,
    pub tokens: Mutex<Vec<CancelToken>>,
}

impl Default for FakeServices {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            keyword_loaded: AtomicBool::new(true),
            can_replace_keyword: AtomicBool::new(true),
            templates: Mutex::new(HashMap::new()),
            downloads_in_progress: AtomicUsize::new(0),
            bookmarked: Mutex::new(HashSet::new()),
            print_available: AtomicBool::new(true),
            print_owns_gone: AtomicBool::new(false),
            autofill_suggestions: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
        }
    }
}

impl FakeServices {
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().clone()
    }

    pub fn has(&self, call: &ServiceCall) -> bool {
        self.calls.lock().contains(call)
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Cancel tokens handed to services, oldest first.
    pub fn tokens(&self) -> Vec<CancelToken> {
        self.tokens.lock().clone()
    }

    fn record(&self, call: ServiceCall) {
        self.calls.lock().push(call);
    }

    pub fn profile_services(self: &Arc<Self>) -> ProfileServices {
        ProfileServices {
            password_manager: Some(self.clone()),
            autofill: Some(self.clone()),
            favicons: Some(self.clone()),
            keyword_model: Some(self.clone()),
            keyword_fetcher: Some(self.clone()),
            history: Some(self.clone()),
            downloads: Some(self.clone()),
            bookmarks: Some(self.clone()),
            print: Some(self.clone()),
            save_package: Some(self.clone()),
            shortcuts: Some(self.clone()),
            file_dialogs: Some(self.clone()),
            js_dialogs: Some(self.clone()),
        }
    }
}

impl PasswordManager for FakeServices {
    fn forms_seen(&self, _tab: TabId, forms: &[PasswordForm]) {
        self.record(ServiceCall::FormsSeen(forms.len()));
    }

    fn provisionally_save(&self, _tab: TabId, form: &PasswordForm) {
        self.record(ServiceCall::ProvisionallySave(form.origin.clone()));
    }

    fn clear_provisional(&self, _tab: TabId) {
        self.record(ServiceCall::ClearProvisional);
    }

    fn did_navigate(&self, _tab: TabId) {
        self.record(ServiceCall::PasswordDidNavigate);
    }

    fn did_stop_loading(&self, _tab: TabId) {
        self.record(ServiceCall::PasswordDidStopLoading);
    }
}

impl AutofillManager for FakeServices {
    fn form_submitted(&self, _form: &AutofillForm) {
        self.record(ServiceCall::AutofillSubmitted);
    }

    fn suggestions(&self, _field_name: &str, prefix: &str, limit: usize) -> Vec<String> {
        self.autofill_suggestions
            .lock()
            .iter()
            .filter(|value| value.starts_with(prefix))
            .take(limit)
            .cloned()
            .collect()
    }

    fn remove_entry(&self, field_name: &str, value: &str) {
        self.record(ServiceCall::RemoveAutofill(field_name.to_string(), value.to_string()));
    }
}

impl FaviconService for FakeServices {
    fn fetch(&self, _tab: TabId, page_url: &Url) {
        self.record(ServiceCall::FaviconFetch(page_url.clone()));
    }

    fn set_url(&self, _tab: TabId, icon_url: &Url) {
        self.record(ServiceCall::FaviconSetUrl(icon_url.clone()));
    }

    fn set_icon(&self, _tab: TabId, download_id: i32, _icon_url: &Url, _bitmap: &Bitmap) {
        self.record(ServiceCall::FaviconSetIcon(download_id));
    }

    fn download_failed(&self, _tab: TabId, download_id: i32) {
        self.record(ServiceCall::FaviconFailed(download_id));
    }
}

impl KeywordModel for FakeServices {
    fn is_loaded(&self) -> bool {
        self.keyword_loaded.load(Ordering::SeqCst)
    }

    fn load(&self) {
        self.record(ServiceCall::KeywordLoad);
    }

    fn template_url_for_keyword(&self, keyword: &str) -> Option<TemplateUrl> {
        self.templates.lock().get(keyword).cloned()
    }

    fn can_replace_keyword(&self, _keyword: &str, _url: &str) -> bool {
        self.can_replace_keyword.load(Ordering::SeqCst)
    }

    fn add(&self, template_url: TemplateUrl) {
        self.templates
            .lock()
            .insert(template_url.keyword.clone(), template_url.clone());
        self.record(ServiceCall::KeywordAdd(template_url));
    }

    fn remove(&self, keyword: &str) {
        self.templates.lock().remove(keyword);
        self.record(ServiceCall::KeywordRemove(keyword.to_string()));
    }
}

impl KeywordFetcher for FakeServices {
    fn schedule_download(&self, keyword: &str, osdd_url: &Url, favicon_url: Option<&Url>, autodetected: bool) {
        self.record(ServiceCall::ScheduleDownload {
            keyword: keyword.to_string(),
            osdd: osdd_url.clone(),
            favicon: favicon_url.cloned(),
            autodetected,
        });
    }
}

impl HistoryService for FakeServices {
    fn add_page(&self, request: AddPageRequest) {
        self.record(ServiceCall::AddPage(request));
    }

    fn set_page_title(&self, url: &Url, title: &str) {
        self.record(ServiceCall::SetPageTitle(url.clone(), title.to_string()));
    }

    fn set_page_thumbnail(&self, url: &Url, _bitmap: &Bitmap, _score: ThumbnailScore) {
        self.record(ServiceCall::SetThumbnail(url.clone()));
    }

    fn set_favicon_out_of_date(&self, url: &Url) {
        self.record(ServiceCall::FaviconOutOfDate(url.clone()));
    }
}

impl DownloadService for FakeServices {
    fn in_progress_count(&self) -> usize {
        self.downloads_in_progress.load(Ordering::SeqCst)
    }

    fn download_url(&self, _tab: TabId, url: &Url, _referrer: Option<&Url>) {
        self.record(ServiceCall::DownloadUrl(url.clone()));
    }
}

impl BookmarkService for FakeServices {
    fn is_loaded(&self) -> bool {
        true
    }

    fn is_bookmarked(&self, url: &Url) -> bool {
        self.bookmarked.lock().contains(url)
    }
}

impl PrintService for FakeServices {
    fn begin(&self, _tab: TabId) -> bool {
        self.record(ServiceCall::PrintBegin);
        self.print_available.load(Ordering::SeqCst)
    }

    fn stop(&self, _tab: TabId) {
        self.record(ServiceCall::PrintStop);
    }

    fn render_view_gone(&self, _tab: TabId, _endpoint: EndpointId) -> bool {
        !self.print_owns_gone.load(Ordering::SeqCst)
    }

    fn did_get_printed_pages_count(&self, _tab: TabId, _cookie: i32, page_count: i32) {
        self.record(ServiceCall::PrintedPagesCount(page_count));
    }

    fn did_print_page(&self, _tab: TabId, _cookie: i32, page_number: i32) {
        self.record(ServiceCall::PrintedPage(page_number));
    }
}

impl SavePackageService for FakeServices {
    fn save(&self, request: SaveRequest) {
        self.tokens.lock().push(request.cancel.clone());
        self.record(ServiceCall::Save(request.page_url));
    }
}

impl ShortcutInstaller for FakeServices {
    fn install(&self, request: ShortcutRequest) {
        self.tokens.lock().push(request.cancel.clone());
        self.record(ServiceCall::InstallShortcut {
            url: request.url,
            title: request.title,
        });
    }
}

impl FileDialogService for FakeServices {
    fn select_file(&self, request: FileChooserRequest) {
        self.tokens.lock().push(request.cancel.clone());
        self.record(ServiceCall::SelectFile {
            multiple: request.multiple,
        });
    }
}

impl JsDialogPresenter for FakeServices {
    fn show(&self, request: JsDialogRequest) {
        self.record(ServiceCall::ShowJsDialog(request));
    }
}

// --- harness ---------------------------------------------------------------

/// A tab wired to fakes, with helpers to play the content process side.
pub(crate) struct Harness {
    pub tab: Tab,
    pub factory: Arc<FakeFactory>,
    pub delegate: Arc<RecordingDelegate>,
    pub services: Arc<FakeServices>,
    pub clock: Arc<ManualClock>,
    pub hung: Arc<HungRendererTracker>,
    pub loader: Arc<RecordingLoader>,
    pub process: ProcessServices,
    pub notifications: UnboundedReceiver<Notification>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(false, TabSettings::default())
    }

    pub fn incognito() -> Self {
        Self::build(true, TabSettings::default())
    }

    pub fn with_settings(settings: TabSettings) -> Self {
        Self::build(false, settings)
    }

    fn build(incognito: bool, settings: TabSettings) -> Self {
        let factory = Arc::new(FakeFactory::new());
        let delegate = Arc::new(RecordingDelegate::default());
        let services = Arc::new(FakeServices::default());
        let clock = Arc::new(ManualClock::new());
        let hung = Arc::new(HungRendererTracker::new());
        let loader = Arc::new(RecordingLoader::default());

        let process = ProcessServices::new()
            .with_clock(clock.clone())
            .with_hung_renderer_ui(hung.clone())
            .with_loader(loader.clone());
        let notifications = process.bus.subscribe();

        let profile = Profile::new(PrefService::with_browser_defaults(), services.profile_services());
        let profile = if incognito { profile.incognito() } else { profile };

        let context = TabContext {
            profile: Arc::new(profile),
            services: process.clone(),
            factory: factory.clone(),
            delegate: Some(delegate.clone()),
            settings,
        };
        let tab = Tab::new(context, None).unwrap();

        Self {
            tab,
            factory,
            delegate,
            services,
            clock,
            hung,
            loader,
            process,
            notifications,
        }
    }

    pub fn current(&self) -> EndpointId {
        self.tab.manager().current().id()
    }

    pub fn pending(&self) -> Option<EndpointId> {
        self.tab.manager().pending().map(|host| host.id())
    }

    pub fn send(&mut self, endpoint: EndpointId, event: InboundEvent) {
        self.tab.handle_event(endpoint, event);
    }

    /// Starts a typed navigation and returns the endpoint asked to load it.
    pub fn navigate(&mut self, s: &str) -> EndpointId {
        self.tab
            .load_url(url(s), None, PageTransition::new(TransitionType::Typed))
            .unwrap();
        self.pending().unwrap_or_else(|| self.current())
    }

    /// The next page id `endpoint` would hand out.
    pub fn next_page_id(&self, endpoint: EndpointId) -> i32 {
        let host = self.tab.manager().host(endpoint).unwrap();
        host.site_instance().max_page_id().max(0) + 1
    }

    pub fn commit_params(&mut self, endpoint: EndpointId, params: FrameNavigateParams) {
        self.send(endpoint, InboundEvent::FrameNavigate(params));
    }

    /// Reports a new main-frame page from `endpoint`; returns its page id.
    pub fn commit(&mut self, endpoint: EndpointId, s: &str) -> i32 {
        let page_id = self.next_page_id(endpoint);
        let params = FrameNavigateParams::new(page_id, url(s), PageTransition::new(TransitionType::Typed));
        self.commit_params(endpoint, params);
        page_id
    }

    /// Navigates to `s` in the current endpoint and commits it.
    pub fn load(&mut self, s: &str) -> i32 {
        let endpoint = self.navigate(s);
        self.send(endpoint, InboundEvent::RenderViewReady);
        self.commit(endpoint, s)
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            drained.push(notification);
        }
        drained
    }

    pub fn kinds(&mut self) -> Vec<NotificationKind> {
        self.drain().into_iter().map(|n| n.kind).collect()
    }
}
