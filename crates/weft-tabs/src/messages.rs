//! Messages exchanged with content process endpoints
//!
//! Inbound events arrive tagged with the endpoint that sent them and are
//! dispatched by `Tab::handle_event`. Names describe the contract only; the
//! transport encoding belongs to the endpoint implementation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use weft_navigation::{AutofillForm, Bitmap, FeedLink, FrameNavigateParams, PageTransition, PasswordForm};
use weft_services::{GlobalRequestId, JsDialogKind, Rect, ThumbnailScore};

use crate::state::LoadState;
use crate::web_prefs::WebPreferences;

/// `net::ERR_ABORTED`: the load was cancelled (user stop, download, new navigation).
pub const ERR_ABORTED: i32 = -3;

/// Where a renderer-requested URL should open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowOpenDisposition {
    CurrentTab,
    NewForegroundTab,
    NewBackgroundTab,
    NewPopup,
    NewWindow,
    SaveToDisk,
    OffTheRecord,
    IgnoreAction,
}

/// Page-declared metadata used when creating an application shortcut.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub title: String,
    pub description: String,
    pub app_url: Option<Url>,
}

/// Everything an endpoint needs to load one navigation entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigateParams {
    pub page_id: i32,
    pub url: Url,
    pub referrer: Option<Url>,
    pub transition: PageTransition,
    pub content_state: Vec<u8>,
    pub reload: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// The endpoint's view finished initializing.
    RenderViewReady,
    /// The content process died.
    RenderViewGone,
    FrameNavigate(FrameNavigateParams),
    UpdateState {
        page_id: i32,
        content_state: Vec<u8>,
    },
    UpdateTitle {
        page_id: i32,
        title: String,
    },
    UpdateEncoding {
        encoding: String,
    },
    UpdateTargetUrl {
        page_id: i32,
        url: Option<Url>,
    },
    UpdateFeedList {
        page_id: i32,
        feeds: Vec<FeedLink>,
    },
    UpdateFavIconUrl {
        page_id: i32,
        icon_url: Url,
    },
    DidDownloadFavIcon {
        download_id: i32,
        image_url: Url,
        errored: bool,
        image: Bitmap,
    },
    UpdateThumbnail {
        url: Url,
        bitmap: Bitmap,
        score: ThumbnailScore,
    },
    Close,
    RequestMove {
        rect: Rect,
    },
    DidStartLoading,
    DidStopLoading,
    DidStartProvisionalLoad {
        is_main_frame: bool,
        url: Url,
    },
    DidRedirectProvisionalLoad {
        page_id: i32,
        source_url: Url,
        target_url: Url,
    },
    DidFailProvisionalLoad {
        is_main_frame: bool,
        error_code: i32,
        url: Url,
    },
    DidLoadResourceFromMemoryCache {
        url: Url,
        frame_origin: String,
        main_frame_origin: String,
        security_info: String,
    },
    LoadStateChanged {
        url: Url,
        state: LoadState,
    },
    RunJavaScriptMessage {
        reply_id: u64,
        kind: JsDialogKind,
        message: String,
        default_prompt: String,
        frame_url: Option<Url>,
    },
    RunBeforeUnloadConfirm {
        reply_id: u64,
        message: String,
    },
    ShowModalHtmlDialog {
        reply_id: u64,
        url: Url,
        width: i32,
        height: i32,
        json_arguments: String,
    },
    PasswordFormsSeen {
        forms: Vec<PasswordForm>,
    },
    AutofillFormSubmitted {
        form: AutofillForm,
    },
    GetAutofillSuggestions {
        field_name: String,
        user_text: String,
        node_id: i64,
        request_id: i32,
    },
    RemoveAutofillEntry {
        field_name: String,
        value: String,
    },
    PageHasOsdd {
        page_id: i32,
        url: Url,
        autodetected: bool,
    },
    FindReply {
        request_id: i32,
        number_of_matches: i32,
        selection_rect: Rect,
        active_match_ordinal: i32,
        final_update: bool,
    },
    DidGetApplicationInfo {
        page_id: i32,
        info: ApplicationInfo,
    },
    DomOperationResponse {
        json: String,
        automation_id: i32,
    },
    DomInspectElementResponse {
        num_resources: i32,
    },
    DomUiMessage {
        message: String,
        content: String,
    },
    RequestOpenUrl {
        url: Url,
        referrer: Option<Url>,
        disposition: WindowOpenDisposition,
    },
    RunFileChooser {
        multiple: bool,
        title: String,
        default_file: Option<PathBuf>,
    },
    DidGetPrintedPagesCount {
        cookie: i32,
        page_count: i32,
    },
    DidPrintPage {
        cookie: i32,
        page_number: i32,
    },
    CrashedPlugin {
        plugin_path: PathBuf,
    },
    CrashedWorker,
    JsOutOfMemory,
    /// Hang detection fired. `is_during_unload` when the endpoint was running
    /// a beforeunload or unload handler.
    RendererUnresponsive {
        is_during_unload: bool,
    },
    RendererResponsive,
    /// The beforeunload handler finished.
    ShouldCloseAck {
        proceed: bool,
    },
    /// The unload handler finished. `request` is the paused cross-site
    /// response to release, or `None` when the tab itself is closing.
    ClosePageAck {
        request: Option<GlobalRequestId>,
    },
    /// From the resource loader: the pending endpoint's response is ready and
    /// paused until the current page has unloaded.
    CrossSiteResponse {
        request: GlobalRequestId,
    },
    /// From the resource loader: the pending endpoint's response turned out
    /// to be a download.
    CrossSiteDownload,
}

impl InboundEvent {
    /// Events a pending (not yet committed) endpoint may legitimately send.
    pub fn accepted_from_pending(&self) -> bool {
        matches!(
            self,
            InboundEvent::RenderViewReady
                | InboundEvent::RenderViewGone
                | InboundEvent::FrameNavigate(_)
                | InboundEvent::DidStartLoading
                | InboundEvent::DidStopLoading
                | InboundEvent::DidStartProvisionalLoad { .. }
                | InboundEvent::DidRedirectProvisionalLoad { .. }
                | InboundEvent::DidFailProvisionalLoad { .. }
                | InboundEvent::DidLoadResourceFromMemoryCache { .. }
                | InboundEvent::LoadStateChanged { .. }
                | InboundEvent::CrossSiteResponse { .. }
                | InboundEvent::CrossSiteDownload
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::RenderViewReady => "RenderViewReady",
            InboundEvent::RenderViewGone => "RenderViewGone",
            InboundEvent::FrameNavigate(_) => "FrameNavigate",
            InboundEvent::UpdateState { .. } => "UpdateState",
            InboundEvent::UpdateTitle { .. } => "UpdateTitle",
            InboundEvent::UpdateEncoding { .. } => "UpdateEncoding",
            InboundEvent::UpdateTargetUrl { .. } => "UpdateTargetURL",
            InboundEvent::UpdateFeedList { .. } => "UpdateFeedList",
            InboundEvent::UpdateFavIconUrl { .. } => "UpdateFavIconURL",
            InboundEvent::DidDownloadFavIcon { .. } => "DidDownloadFavIcon",
            InboundEvent::UpdateThumbnail { .. } => "UpdateThumbnail",
            InboundEvent::Close => "Close",
            InboundEvent::RequestMove { .. } => "RequestMove",
            InboundEvent::DidStartLoading => "DidStartLoading",
            InboundEvent::DidStopLoading => "DidStopLoading",
            InboundEvent::DidStartProvisionalLoad { .. } => "DidStartProvisionalLoad",
            InboundEvent::DidRedirectProvisionalLoad { .. } => "DidRedirectProvisionalLoad",
            InboundEvent::DidFailProvisionalLoad { .. } => "DidFailProvisionalLoad",
            InboundEvent::DidLoadResourceFromMemoryCache { .. } => "DidLoadResourceFromMemoryCache",
            InboundEvent::LoadStateChanged { .. } => "LoadStateChanged",
            InboundEvent::RunJavaScriptMessage { .. } => "RunJavaScriptMessage",
            InboundEvent::RunBeforeUnloadConfirm { .. } => "RunBeforeUnloadConfirm",
            InboundEvent::ShowModalHtmlDialog { .. } => "ShowModalHTMLDialog",
            InboundEvent::PasswordFormsSeen { .. } => "PasswordFormsSeen",
            InboundEvent::AutofillFormSubmitted { .. } => "AutofillFormSubmitted",
            InboundEvent::GetAutofillSuggestions { .. } => "GetAutofillSuggestions",
            InboundEvent::RemoveAutofillEntry { .. } => "RemoveAutofillEntry",
            InboundEvent::PageHasOsdd { .. } => "PageHasOSDD",
            InboundEvent::FindReply { .. } => "FindReply",
            InboundEvent::DidGetApplicationInfo { .. } => "DidGetApplicationInfo",
            InboundEvent::DomOperationResponse { .. } => "DomOperationResponse",
            InboundEvent::DomInspectElementResponse { .. } => "DomInspectElementResponse",
            InboundEvent::DomUiMessage { .. } => "DomUiMessage",
            InboundEvent::RequestOpenUrl { .. } => "RequestOpenURL",
            InboundEvent::RunFileChooser { .. } => "RunFileChooser",
            InboundEvent::DidGetPrintedPagesCount { .. } => "DidGetPrintedPagesCount",
            InboundEvent::DidPrintPage { .. } => "DidPrintPage",
            InboundEvent::CrashedPlugin { .. } => "CrashedPlugin",
            InboundEvent::CrashedWorker => "CrashedWorker",
            InboundEvent::JsOutOfMemory => "JsOutOfMemory",
            InboundEvent::RendererUnresponsive { .. } => "RendererUnresponsive",
            InboundEvent::RendererResponsive => "RendererResponsive",
            InboundEvent::ShouldCloseAck { .. } => "ShouldCloseAck",
            InboundEvent::ClosePageAck { .. } => "ClosePageAck",
            InboundEvent::CrossSiteResponse { .. } => "CrossSiteResponse",
            InboundEvent::CrossSiteDownload => "CrossSiteDownload",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    NavigateToEntry(NavigateParams),
    Stop,
    Cut,
    Copy,
    Paste,
    DisassociateFromPopupCount,
    EnableViewSourceMode,
    /// Page ids below the reserved count are never handed out again.
    ReservePageIdRange(i32),
    SetInitialFocus {
        reverse: bool,
    },
    PrintPages,
    FileSelected(PathBuf),
    MultiFilesSelected(Vec<PathBuf>),
    PopupNotificationVisibilityChanged(bool),
    UpdateWebPreferences(WebPreferences),
    SetAlternateErrorPageUrl(Option<Url>),
    AllowDomUiBindings,
    /// Run the beforeunload handler; answered by `ShouldCloseAck`.
    ShouldClose,
    /// Run the unload handler; answered by `ClosePageAck`.
    ClosePage {
        request: Option<GlobalRequestId>,
    },
    JsDialogReply {
        reply_id: u64,
        success: bool,
        prompt: String,
    },
    HtmlDialogReply {
        reply_id: u64,
        json_retval: String,
    },
    GetApplicationInfo {
        page_id: i32,
    },
    Find {
        request_id: i32,
        search_text: String,
        forward: bool,
        match_case: bool,
        find_next: bool,
    },
    StopFinding {
        clear_selection: bool,
    },
    AutofillSuggestions {
        node_id: i64,
        request_id: i32,
        suggestions: Vec<String>,
        default_index: i32,
    },
}
