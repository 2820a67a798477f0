//! Routing of inbound endpoint events.

use std::path::Path;
use std::sync::Arc;

use url::Url;

use weft_navigation::{
    file_name_for_url, is_in_page_navigation, AutofillForm, Bitmap, FeedLink, PageTransition,
    PasswordForm,
};
use weft_services::{
    EndpointId, GlobalRequestId, JsDialogKind, JsDialogRequest, LoadDetails, NotificationDetails,
    NotificationKind, ProvisionalLoadDetails, Rect, ShortcutRequest, ThumbnailScore,
    MAX_AUTOFILL_SUGGESTIONS,
};

use super::{Tab, JAVASCRIPT_MESSAGE_EXPECTED_DELAY};
use crate::delegate::{HtmlDialogRequest, InvalidateFlags};
use crate::dom_ui::DomUi;
use crate::infobar::AlertInfoBar;
use crate::manager::BeforeUnloadOutcome;
use crate::messages::{ApplicationInfo, InboundEvent, OutboundMessage, WindowOpenDisposition, ERR_ABORTED};
use crate::state::LoadState;

impl Tab {
    /// Handles one event sent by `endpoint`.
    ///
    /// Events from endpoints this tab no longer owns are dropped. A pending
    /// endpoint may only report on its own load until it commits.
    pub fn handle_event(&mut self, endpoint: EndpointId, event: InboundEvent) {
        let from_current = self.manager.is_current(endpoint);
        let from_pending = self.manager.is_pending(endpoint);
        if !from_current && !(from_pending && event.accepted_from_pending()) {
            tracing::debug!(
                tab_id = %self.id,
                endpoint = %endpoint,
                event = event.name(),
                "Dropping event from inactive endpoint"
            );
            return;
        }

        match event {
            InboundEvent::RenderViewReady => {
                if from_current {
                    self.notify_connected();
                    self.set_is_crashed(false);
                }
            }
            InboundEvent::RenderViewGone => self.render_view_gone(endpoint),
            InboundEvent::FrameNavigate(params) => self.did_navigate(endpoint, params),
            InboundEvent::UpdateState {
                page_id,
                content_state,
            } => self.update_state(page_id, content_state),
            InboundEvent::UpdateTitle { page_id, title } => self.update_title(page_id, &title),
            InboundEvent::UpdateEncoding { encoding } => self.encoding = encoding,
            InboundEvent::UpdateTargetUrl { url, .. } => {
                if let Some(delegate) = &self.context.delegate {
                    delegate.update_target_url(self.id, url.as_ref());
                }
            }
            InboundEvent::UpdateFeedList { page_id, feeds } => self.update_feed_list(page_id, feeds),
            InboundEvent::UpdateFavIconUrl { page_id, icon_url } => {
                self.update_favicon_url(page_id, icon_url)
            }
            InboundEvent::DidDownloadFavIcon {
                download_id,
                image_url,
                errored,
                image,
            } => self.did_download_favicon(download_id, image_url, errored, image),
            InboundEvent::UpdateThumbnail { url, bitmap, score } => {
                self.update_thumbnail(&url, &bitmap, score)
            }
            InboundEvent::Close => {
                if let Some(delegate) = &self.context.delegate {
                    delegate.close_contents(self.id);
                }
            }
            InboundEvent::RequestMove { rect } => self.request_move(rect),
            InboundEvent::DidStartLoading => {
                if let Some(host) = self.manager.host_mut(endpoint) {
                    host.set_is_loading(true);
                }
                self.set_is_loading(true, None)
            }
            InboundEvent::DidStopLoading => {
                if let Some(host) = self.manager.host_mut(endpoint) {
                    host.set_is_loading(false);
                }
                self.did_stop_loading()
            }
            InboundEvent::DidStartProvisionalLoad { is_main_frame, url } => {
                self.did_start_provisional_load(is_main_frame, url)
            }
            InboundEvent::DidRedirectProvisionalLoad {
                page_id,
                source_url,
                target_url,
            } => self.did_redirect_provisional_load(endpoint, page_id, &source_url, target_url),
            InboundEvent::DidFailProvisionalLoad {
                is_main_frame,
                error_code,
                url,
            } => self.did_fail_provisional_load(endpoint, is_main_frame, error_code, url),
            InboundEvent::DidLoadResourceFromMemoryCache {
                url,
                frame_origin,
                main_frame_origin,
                security_info,
            } => self.notify_with(
                NotificationKind::LoadFromMemoryCache,
                NotificationDetails::MemoryCacheLoad {
                    url,
                    frame_origin,
                    main_frame_origin,
                    security_info,
                },
            ),
            InboundEvent::LoadStateChanged { url, state } => self.load_state_changed(&url, state),
            InboundEvent::RunJavaScriptMessage {
                reply_id,
                kind,
                message,
                default_prompt,
                frame_url,
            } => self.run_javascript_message(reply_id, kind, message, default_prompt, frame_url),
            InboundEvent::RunBeforeUnloadConfirm { reply_id, message } => {
                self.run_before_unload_confirm(reply_id, &message)
            }
            InboundEvent::ShowModalHtmlDialog {
                reply_id,
                url,
                width,
                height,
                json_arguments,
            } => self.show_modal_html_dialog(HtmlDialogRequest {
                tab: self.id,
                reply_id,
                url,
                width,
                height,
                json_arguments,
            }),
            InboundEvent::PasswordFormsSeen { forms } => self.password_forms_seen(&forms),
            InboundEvent::AutofillFormSubmitted { form } => self.autofill_form_submitted(&form),
            InboundEvent::GetAutofillSuggestions {
                field_name,
                user_text,
                node_id,
                request_id,
            } => self.get_autofill_suggestions(&field_name, &user_text, node_id, request_id),
            InboundEvent::RemoveAutofillEntry { field_name, value } => {
                if let Some(autofill) = &self.context.profile.services().autofill {
                    autofill.remove_entry(&field_name, &value);
                }
            }
            InboundEvent::PageHasOsdd {
                page_id,
                url,
                autodetected,
            } => self.page_has_osdd(page_id, &url, autodetected),
            InboundEvent::FindReply {
                request_id,
                number_of_matches,
                selection_rect,
                active_match_ordinal,
                final_update,
            } => self.find_reply(
                request_id,
                number_of_matches,
                selection_rect,
                active_match_ordinal,
                final_update,
            ),
            InboundEvent::DidGetApplicationInfo { page_id, info } => {
                self.did_get_application_info(page_id, info)
            }
            InboundEvent::DomOperationResponse {
                json,
                automation_id,
            } => self.notify_with(
                NotificationKind::DomOperationResponse,
                NotificationDetails::DomOperation {
                    json,
                    automation_id,
                },
            ),
            InboundEvent::DomInspectElementResponse { num_resources } => self.notify_with(
                NotificationKind::DomInspectElementResponse,
                NotificationDetails::InspectElement { num_resources },
            ),
            InboundEvent::DomUiMessage { message, content } => {
                self.dom_ui_message(&message, &content)
            }
            InboundEvent::RequestOpenUrl {
                url,
                referrer,
                disposition,
            } => self.request_open_url(&url, referrer.as_ref(), disposition),
            InboundEvent::RunFileChooser {
                multiple,
                title,
                default_file,
            } => self.run_file_chooser(multiple, title, default_file),
            InboundEvent::DidGetPrintedPagesCount { cookie, page_count } => {
                if let Some(print) = &self.context.profile.services().print {
                    print.did_get_printed_pages_count(self.id, cookie, page_count);
                }
            }
            InboundEvent::DidPrintPage {
                cookie,
                page_number,
            } => {
                if let Some(print) = &self.context.profile.services().print {
                    print.did_print_page(self.id, cookie, page_number);
                }
            }
            InboundEvent::CrashedPlugin { plugin_path } => self.crashed_plugin(&plugin_path),
            InboundEvent::CrashedWorker => {
                self.add_crash_info_bar("A worker has crashed.".to_string())
            }
            InboundEvent::JsOutOfMemory => self
                .add_crash_info_bar("The JavaScript on this page ran out of memory.".to_string()),
            InboundEvent::RendererUnresponsive { is_during_unload } => {
                self.renderer_unresponsive(is_during_unload)
            }
            InboundEvent::RendererResponsive => {
                self.context.services.hung_renderer_ui.hide_for_tab(self.id)
            }
            InboundEvent::ShouldCloseAck { proceed } => self.should_close_ack(proceed),
            InboundEvent::ClosePageAck { request } => self.close_page_ack(request),
            InboundEvent::CrossSiteResponse { request } => {
                if from_pending {
                    self.manager.on_cross_site_response(request);
                }
            }
            InboundEvent::CrossSiteDownload => {
                if from_pending {
                    self.manager.cross_site_download_detected();
                }
            }
        }
    }

    fn render_view_gone(&mut self, endpoint: EndpointId) {
        if let Some(print) = &self.context.profile.services().print {
            if !print.render_view_gone(self.id, endpoint) {
                return;
            }
        }
        // A pending endpoint that dies is dealt with if it ever becomes current.
        if !self.manager.is_current(endpoint) {
            return;
        }
        tracing::warn!(tab_id = %self.id, endpoint = %endpoint, "Renderer gone");
        self.current_endpoint_gone();
    }

    fn update_state(&mut self, page_id: i32, content_state: Vec<u8>) {
        let instance = Arc::clone(self.manager.current().site_instance());
        let Some(entry) = self.controller.entry_with_page_id_mut(&instance, page_id) else {
            return;
        };
        if entry.content_state != content_state {
            entry.content_state = content_state;
        }
    }

    fn update_title(&mut self, page_id: i32, title: &str) {
        self.set_not_waiting_for_response();

        let instance = Arc::clone(self.manager.current().site_instance());
        let Some(entry) = self.controller.entry_with_page_id_mut(&instance, page_id) else {
            return;
        };

        // Files without a title show their file name, which is not a real
        // page title as far as history is concerned.
        let (final_title, explicit) = if entry.url.scheme() == "file" && title.is_empty() {
            (file_name_for_url(&entry.url).unwrap_or_default(), false)
        } else {
            (title.trim().to_string(), true)
        };
        if entry.title == final_title {
            return;
        }
        entry.title = final_title.clone();
        let display_url = entry.display_url().clone();

        if !self.received_page_title {
            if let Some(history) = self.context.profile.history() {
                history.set_page_title(&display_url, &final_title);
                self.received_page_title = explicit;
            }
        }

        let is_last_committed = self
            .controller
            .last_committed_entry()
            .is_some_and(|entry| entry.page_id == page_id && entry.belongs_to(&instance));
        if is_last_committed {
            if let Some(delegate) = &self.context.delegate {
                delegate.navigation_state_changed(self.id, InvalidateFlags::TITLE);
            }
        }
    }

    fn update_feed_list(&mut self, page_id: i32, feeds: Vec<FeedLink>) {
        if !self.is_active_entry(page_id) {
            return;
        }
        let instance = Arc::clone(self.manager.current().site_instance());
        if let Some(entry) = self.controller.entry_with_page_id_mut(&instance, page_id) {
            entry.feedlist = feeds;
        }
        if let Some(delegate) = &self.context.delegate {
            delegate.navigation_state_changed(self.id, InvalidateFlags::FEEDLIST);
        }
    }

    fn update_favicon_url(&mut self, page_id: i32, icon_url: Url) {
        let instance = Arc::clone(self.manager.current().site_instance());
        let Some(entry) = self.controller.entry_with_page_id_mut(&instance, page_id) else {
            return;
        };
        entry.favicon.url = Some(icon_url.clone());
        if let Some(favicons) = &self.context.profile.services().favicons {
            favicons.set_url(self.id, &icon_url);
        }
    }

    fn did_download_favicon(&mut self, download_id: i32, image_url: Url, errored: bool, image: Bitmap) {
        let Some(favicons) = self.context.profile.services().favicons.clone() else {
            return;
        };
        if errored || image.is_empty() {
            favicons.download_failed(self.id, download_id);
            return;
        }
        favicons.set_icon(self.id, download_id, &image_url, &image);

        let Some(entry) = self.controller.last_committed_entry_mut() else {
            return;
        };
        if entry.favicon.url.as_ref() != Some(&image_url) {
            return;
        }
        entry.favicon.bitmap = image;
        entry.favicon.is_valid = true;
        if let Some(delegate) = &self.context.delegate {
            delegate.navigation_state_changed(self.id, InvalidateFlags::FAVICON);
        }
    }

    fn update_thumbnail(&self, url: &Url, bitmap: &Bitmap, score: ThumbnailScore) {
        if let Some(history) = self.context.profile.history() {
            history.set_page_thumbnail(url, bitmap, score);
        }
    }

    fn request_move(&self, rect: Rect) {
        let Some(delegate) = &self.context.delegate else {
            return;
        };
        if delegate.is_popup(self.id) {
            delegate.move_contents(self.id, rect);
        }
    }

    fn did_stop_loading(&mut self) {
        let now = self.now();
        let details = self.controller.active_entry().map(|entry| LoadDetails {
            url: entry.display_url().clone(),
            transition: entry.transition,
            elapsed: self
                .current_load_start
                .map(|start| now.saturating_duration_since(start))
                .unwrap_or_default(),
            entry_index: self
                .controller
                .pending_entry_index()
                .or(self.controller.last_committed_entry_index()),
        });

        if let Some(passwords) = &self.context.profile.services().password_manager {
            passwords.did_stop_loading(self.id);
        }
        self.set_is_loading(false, details);
    }

    fn did_start_provisional_load(&mut self, is_main_frame: bool, url: Url) {
        let is_in_page = self
            .controller
            .last_committed_entry()
            .is_some_and(|entry| is_in_page_navigation(&entry.url, &url));
        self.notify_with(
            NotificationKind::FrameProvisionalLoadStart,
            NotificationDetails::ProvisionalLoad(ProvisionalLoadDetails {
                is_main_frame,
                is_in_page,
                url,
                error_code: None,
            }),
        );
    }

    fn did_redirect_provisional_load(
        &mut self,
        endpoint: EndpointId,
        page_id: i32,
        source_url: &Url,
        target_url: Url,
    ) {
        let Some(instance) = self
            .manager
            .host(endpoint)
            .map(|host| Arc::clone(host.site_instance()))
        else {
            return;
        };
        let entry = if page_id == -1 {
            self.controller.pending_entry_mut()
        } else {
            self.controller.entry_with_page_id_mut(&instance, page_id)
        };
        let Some(entry) = entry else {
            return;
        };
        if &entry.url != source_url {
            return;
        }
        tracing::debug!(tab_id = %self.id, from = %source_url, to = %target_url, "Provisional load redirected");
        entry.url = target_url;
    }

    fn did_fail_provisional_load(
        &mut self,
        endpoint: EndpointId,
        is_main_frame: bool,
        error_code: i32,
        url: Url,
    ) {
        if error_code == ERR_ABORTED {
            if self.controller.transient_entry().is_some() {
                tracing::warn!(tab_id = %self.id, url = %url, "Discarding aborted load while an interstitial is showing");
                return;
            }
            if self.controller.pending_entry().is_some_and(|entry| entry.url == url) {
                self.controller.discard_non_committed_entries();
                if let Some(delegate) = &self.context.delegate {
                    delegate.navigation_state_changed(self.id, InvalidateFlags::URL);
                }
            }
            self.manager.renderer_aborted_provisional_load(endpoint);
            self.stop_loading_if_orphaned();
        }

        let is_in_page = self
            .controller
            .last_committed_entry()
            .is_some_and(|entry| is_in_page_navigation(&entry.url, &url));
        self.notify_with(
            NotificationKind::FailProvisionalLoadWithError,
            NotificationDetails::ProvisionalLoad(ProvisionalLoadDetails {
                is_main_frame,
                is_in_page,
                url,
                error_code: Some(error_code),
            }),
        );
    }

    fn load_state_changed(&mut self, url: &Url, state: LoadState) {
        if !self.is_loading {
            return;
        }
        self.load_state = state;
        self.load_state_host = url.host_str().unwrap_or_default().to_string();
        if state == LoadState::ReadingResponse {
            self.set_not_waiting_for_response();
        }
        if let Some(delegate) = &self.context.delegate {
            delegate.navigation_state_changed(self.id, InvalidateFlags::LOAD);
        }
    }

    fn run_javascript_message(
        &mut self,
        reply_id: u64,
        kind: JsDialogKind,
        message: String,
        default_prompt: String,
        frame_url: Option<Url>,
    ) {
        let constrained = self
            .context
            .delegate
            .as_ref()
            .is_some_and(|delegate| delegate.has_constraining_contents(self.id));
        if self.suppress_js_messages || constrained {
            tracing::debug!(tab_id = %self.id, reply_id, "JavaScript dialog suppressed");
            self.on_javascript_message_box_closed(reply_id, false, "");
            return;
        }
        let Some(presenter) = self.context.profile.services().js_dialogs.clone() else {
            self.on_javascript_message_box_closed(reply_id, false, "");
            return;
        };

        let now = self.now();
        let show_suppress_checkbox = self
            .last_js_dismissal
            .is_some_and(|dismissed| now.saturating_duration_since(dismissed) < JAVASCRIPT_MESSAGE_EXPECTED_DELAY);
        presenter.show(JsDialogRequest {
            tab: self.id,
            dialog_id: reply_id,
            kind,
            message,
            default_prompt,
            frame_url,
            show_suppress_checkbox,
        });
    }

    fn run_before_unload_confirm(&mut self, reply_id: u64, message: &str) {
        let Some(presenter) = self.context.profile.services().js_dialogs.clone() else {
            self.on_javascript_message_box_closed(reply_id, true, "");
            return;
        };
        let message = format!(
            "Are you sure you want to navigate away from this page?\n\n{message}\n\nPress OK to continue, or Cancel to stay on the current page."
        );
        presenter.show(JsDialogRequest {
            tab: self.id,
            dialog_id: reply_id,
            kind: JsDialogKind::BeforeUnload,
            message,
            default_prompt: String::new(),
            frame_url: None,
            show_suppress_checkbox: false,
        });
    }

    fn show_modal_html_dialog(&mut self, request: HtmlDialogRequest) {
        match self.context.delegate.clone() {
            Some(delegate) => delegate.show_html_dialog(request),
            None => self.on_html_dialog_closed(request.reply_id, ""),
        }
    }

    fn password_forms_seen(&self, forms: &[PasswordForm]) {
        if let Some(passwords) = &self.context.profile.services().password_manager {
            passwords.forms_seen(self.id, forms);
        }
    }

    fn autofill_form_submitted(&self, form: &AutofillForm) {
        if self.context.profile.is_incognito() || form.is_empty() {
            return;
        }
        if let Some(autofill) = &self.context.profile.services().autofill {
            autofill.form_submitted(form);
        }
    }

    fn get_autofill_suggestions(&mut self, field_name: &str, user_text: &str, node_id: i64, request_id: i32) {
        let suggestions = self
            .context
            .profile
            .services()
            .autofill
            .as_ref()
            .map(|autofill| autofill.suggestions(field_name, user_text, MAX_AUTOFILL_SUGGESTIONS))
            .unwrap_or_default();
        self.manager
            .current_mut()
            .send(OutboundMessage::AutofillSuggestions {
                node_id,
                request_id,
                suggestions,
                default_index: -1,
            });
    }

    fn find_reply(
        &mut self,
        request_id: i32,
        number_of_matches: i32,
        selection_rect: Rect,
        active_match_ordinal: i32,
        final_update: bool,
    ) {
        if request_id != self.find.request_id {
            tracing::trace!(tab_id = %self.id, request_id, "Stale find reply");
            return;
        }

        let result = &mut self.find.result;
        result.request_id = request_id;
        // -1 means "unchanged".
        if number_of_matches != -1 {
            result.number_of_matches = number_of_matches;
        }
        if active_match_ordinal != -1 {
            result.active_match_ordinal = active_match_ordinal;
        }
        if selection_rect.width > 0 && selection_rect.height > 0 {
            result.selection_rect = selection_rect;
        }
        result.final_update = final_update;

        let result = *result;
        self.notify_with(NotificationKind::FindResultAvailable, NotificationDetails::Find(result));
    }

    fn did_get_application_info(&mut self, page_id: i32, info: ApplicationInfo) {
        if !self
            .pending_install
            .as_ref()
            .is_some_and(|install| install.page_id == page_id)
        {
            return;
        }
        let Some(install) = self.pending_install.take() else {
            return;
        };
        let Some(cancel) = self.install_cancel.clone() else {
            return;
        };
        if cancel.is_cancelled() {
            return;
        }
        let Some(shortcuts) = self.context.profile.services().shortcuts.clone() else {
            tracing::warn!(tab_id = %self.id, "No shortcut installer");
            return;
        };

        let title = if info.title.is_empty() {
            install.title
        } else {
            info.title
        };
        shortcuts.install(ShortcutRequest {
            tab: self.id,
            url: info.app_url.unwrap_or(install.url),
            title,
            description: info.description,
            icon: install.icon,
            cancel,
        });
    }

    fn dom_ui_message(&self, message: &str, content: &str) {
        match self.manager.dom_ui() {
            Some(dom_ui) => {
                dom_ui.process_message(message, content);
            }
            None => {
                tracing::warn!(tab_id = %self.id, message, "DOM UI message from a page without DOM UI");
            }
        }
    }

    fn request_open_url(&self, url: &Url, referrer: Option<&Url>, disposition: WindowOpenDisposition) {
        let Some(delegate) = &self.context.delegate else {
            return;
        };
        let transition = self
            .manager
            .dom_ui()
            .map_or_else(PageTransition::default, DomUi::link_transition);
        delegate.open_url(self.id, url, referrer, disposition, transition);
    }

    fn crashed_plugin(&mut self, plugin_path: &Path) {
        let name = plugin_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| plugin_path.display().to_string());
        tracing::warn!(tab_id = %self.id, plugin = %name, "Plugin crashed");
        self.add_crash_info_bar(format!("The following plug-in has crashed: {name}"));
    }

    fn add_crash_info_bar(&mut self, message: String) {
        let page_id = self
            .controller
            .last_committed_entry()
            .map_or(-1, |entry| entry.page_id);
        self.add_info_bar(Box::new(AlertInfoBar::new(message, page_id)));
    }

    fn renderer_unresponsive(&mut self, is_during_unload: bool) {
        if is_during_unload {
            // Treat the hung handler as finished so closing can go on.
            self.manager.current_mut().set_unload_listener_has_fired(true);
            if self.manager.should_close_tab_on_unresponsive_renderer() {
                tracing::warn!(tab_id = %self.id, "Renderer hung in unload handler, closing tab");
                if let Some(delegate) = &self.context.delegate {
                    delegate.close_contents(self.id);
                }
            }
            return;
        }
        if self.manager.current().is_live() {
            self.context.services.hung_renderer_ui.show_for_tab(self.id);
        }
    }

    fn should_close_ack(&mut self, proceed: bool) {
        let delegate = self.context.delegate.clone();
        let tab = self.id;
        let outcome = self.manager.before_unload_fired(proceed, |proceed| {
            delegate
                .as_ref()
                .map_or(proceed, |delegate| delegate.before_unload_fired(tab, proceed))
        });
        tracing::debug!(tab_id = %self.id, proceed, outcome = ?outcome, "Before-unload answered");

        match outcome {
            BeforeUnloadOutcome::CrossSiteCanceled => {
                self.stop_loading_if_orphaned();
                self.controller.discard_non_committed_entries();
                if let Some(delegate) = &delegate {
                    delegate.navigation_state_changed(self.id, InvalidateFlags::URL);
                }
            }
            BeforeUnloadOutcome::TabCloseNow => {
                if let Some(delegate) = &delegate {
                    delegate.close_contents(self.id);
                }
            }
            _ => {}
        }
    }

    fn close_page_ack(&mut self, request: Option<GlobalRequestId>) {
        match request {
            Some(request) => self.manager.on_close_page_ack(request),
            None => {
                if let Some(delegate) = &self.context.delegate {
                    delegate.close_contents(self.id);
                }
            }
        }
    }
}
