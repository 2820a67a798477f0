//! What happens after the controller commits a navigation.

use std::sync::Arc;

use url::Url;

use weft_navigation::{same_domain_or_host, FrameNavigateParams, LoadCommittedDetails, NavigationEntry};
use weft_services::{
    generate_favicon_url, generate_keyword, AddPageRequest, EndpointId, NotificationDetails,
    NotificationKind, TemplateUrl,
};

use super::{Tab, DOWNLOAD_SHELF_HIDE_DELAY};
use crate::delegate::InvalidateFlags;

fn is_form_submit(entry: &NavigationEntry) -> bool {
    entry.transition.is_form_submit()
}

impl Tab {
    pub(super) fn did_navigate(&mut self, endpoint: EndpointId, params: FrameNavigateParams) {
        if params.is_main_frame() {
            if let Some(swap) = self.manager.did_navigate_main_frame(endpoint) {
                self.did_swap(swap);
            }
        }
        if !self.manager.is_current(endpoint) {
            tracing::debug!(tab_id = %self.id, endpoint = %endpoint, "Ignoring commit from a non-current endpoint");
            return;
        }

        let instance = Arc::clone(self.manager.current().site_instance());
        if !instance.has_site() {
            instance.set_site(&params.url);
        }
        if params.is_main_frame() {
            self.contents_mime_type = params.contents_mime_type.clone();
        }

        let Some(details) = self.controller.renderer_did_navigate(&params, &instance) else {
            tracing::debug!(tab_id = %self.id, page_id = params.page_id, "Nothing committed");
            return;
        };
        tracing::info!(
            tab_id = %self.id,
            url = %details.entry.url,
            page_id = details.entry.page_id,
            nav_type = ?details.nav_type,
            "Navigation committed"
        );

        if details.is_main_frame {
            self.did_navigate_main_frame_post_commit(&details);
        }
        self.did_navigate_any_frame_post_commit(&details, &params);

        self.notify_with(
            NotificationKind::NavEntryCommitted,
            NotificationDetails::Committed {
                url: details.entry.url.clone(),
                page_id: details.entry.page_id,
                nav_type: details.nav_type,
                is_main_frame: details.is_main_frame,
            },
        );
        if let Some(delegate) = &self.context.delegate {
            delegate.navigation_state_changed(self.id, InvalidateFlags::all());
        }
    }

    fn did_navigate_main_frame_post_commit(&mut self, details: &LoadCommittedDetails) {
        if self.should_hide_download_shelf(details) {
            self.set_download_shelf_visible(false);
        }

        if details.is_user_initiated_main_frame_load() {
            if let Some(passwords) = &self.context.profile.services().password_manager {
                passwords.did_navigate(self.id);
            }
        }
        if !details.is_in_page {
            self.received_page_title = false;
        }
        if details.previous_url.as_ref() != Some(&details.entry.url) {
            self.suppress_js_messages = false;
        }

        let same_site = details
            .previous_url
            .as_ref()
            .is_some_and(|previous| same_domain_or_host(previous, &details.entry.url));
        if !same_site {
            self.close_constrained_windows();
        }

        self.update_starred_state_for_current_url();
        if let Some(favicons) = &self.context.profile.services().favicons {
            favicons.fetch(self.id, &details.entry.url);
        }
    }

    /// The shelf goes away when leaving the site once downloads are done and
    /// it has been up for a while.
    fn should_hide_download_shelf(&self, details: &LoadCommittedDetails) -> bool {
        if !self.shelf_visible {
            return false;
        }
        let Some(downloads) = &self.context.profile.services().downloads else {
            return false;
        };
        if downloads.in_progress_count() != 0 {
            return false;
        }
        let Some(previous) = &details.previous_url else {
            return false;
        };
        if same_domain_or_host(previous, &details.entry.url) {
            return false;
        }
        let now = self.now();
        self.last_shelf_show
            .map_or(true, |shown| now.saturating_duration_since(shown) > DOWNLOAD_SHELF_HIDE_DELAY)
    }

    fn did_navigate_any_frame_post_commit(&mut self, details: &LoadCommittedDetails, params: &FrameNavigateParams) {
        self.expire_info_bars(details);

        if params.should_update_history {
            self.update_history_for_navigation(params);
        }
        if let Some(form) = &params.password_form {
            if let Some(passwords) = &self.context.profile.services().password_manager {
                passwords.provisionally_save(self.id, form);
            }
        }
        self.generate_keyword_if_necessary(params);
    }

    fn expire_info_bars(&mut self, details: &LoadCommittedDetails) {
        let mut index = self.infobars.len();
        while index > 0 {
            index -= 1;
            if self.infobars[index].should_expire(details) {
                let mut infobar = self.infobars.remove(index);
                infobar.info_bar_closed();
            }
        }
    }

    fn update_history_for_navigation(&self, params: &FrameNavigateParams) {
        let Some(history) = self.context.profile.history() else {
            return;
        };
        let display_url = self.url();

        // Main frames record what the location bar showed, as the last
        // redirect hop.
        let request = match display_url {
            Some(display_url) if params.is_main_frame() && display_url != params.url => {
                let mut redirects = params.redirects.clone();
                if let Some(last) = redirects.last_mut() {
                    *last = display_url.clone();
                }
                AddPageRequest {
                    url: display_url,
                    tab: self.id,
                    page_id: params.page_id,
                    referrer: params.referrer.clone(),
                    transition: params.transition,
                    redirects,
                }
            }
            _ => AddPageRequest {
                url: params.url.clone(),
                tab: self.id,
                page_id: params.page_id,
                referrer: params.referrer.clone(),
                transition: params.transition,
                redirects: params.redirects.clone(),
            },
        };
        history.add_page(request);
    }

    /// Creates a search keyword for a form submitted from a page reached by
    /// typing a site root.
    fn generate_keyword_if_necessary(&mut self, params: &FrameNavigateParams) {
        let Some(search_url) = &params.searchable_form_url else {
            return;
        };
        if self.context.profile.is_incognito() {
            return;
        }
        let Some(last_index) = self.controller.last_committed_entry_index() else {
            return;
        };
        if last_index == 0 {
            return;
        }
        let Some(previous) = self.controller.entry_at_index(last_index - 1) else {
            return;
        };
        if is_form_submit(previous) {
            return;
        }

        let keyword_url = previous.user_typed_url.as_ref().unwrap_or(&previous.url);
        let keyword = generate_keyword(keyword_url, true);
        if keyword.is_empty() {
            return;
        }

        let Some(model) = self.context.profile.services().keyword_model.clone() else {
            return;
        };
        if !model.is_loaded() {
            model.load();
            return;
        }
        let search_url = search_url.as_str();
        if !model.can_replace_keyword(&keyword, search_url) {
            return;
        }
        if let Some(existing) = model.template_url_for_keyword(&keyword) {
            // Keywords from a site's OpenSearch description are kept.
            if existing.originating_url.is_some() {
                return;
            }
            model.remove(&keyword);
        }

        let mut template_url = TemplateUrl::new(&keyword, search_url);
        template_url
            .input_encodings
            .push(params.searchable_form_encoding.clone());
        template_url.favicon_url = self
            .controller
            .last_committed_entry()
            .and_then(|entry| entry.favicon.url.clone())
            .or_else(|| params.referrer.as_ref().and_then(generate_favicon_url));
        template_url.safe_for_autoreplace = true;

        tracing::info!(tab_id = %self.id, keyword = %keyword, "Generated search keyword");
        model.add(template_url);
    }

    /// The page links an OpenSearch description. Schedules a download that
    /// creates a keyword for it unless the user already owns that keyword.
    pub(super) fn page_has_osdd(&mut self, page_id: i32, url: &Url, autodetected: bool) {
        if !self.is_active_entry(page_id) {
            return;
        }
        let Some(model) = self.context.profile.services().keyword_model.clone() else {
            return;
        };
        if !model.is_loaded() {
            model.load();
            return;
        }
        let Some(fetcher) = self.context.profile.services().keyword_fetcher.clone() else {
            return;
        };
        if self.context.profile.is_incognito() {
            return;
        }

        // Form submissions are not where the user came from; use the last
        // page before them.
        let Some(last_index) = self.controller.last_committed_entry_index() else {
            return;
        };
        let Some(base_entry) = (0..=last_index)
            .rev()
            .filter_map(|index| self.controller.entry_at_index(index))
            .find(|entry| !is_form_submit(entry))
        else {
            return;
        };

        let keyword_url = base_entry.user_typed_url.as_ref().unwrap_or(&base_entry.url);
        let keyword = generate_keyword(keyword_url, autodetected);
        if keyword.is_empty() {
            return;
        }
        if let Some(existing) = model.template_url_for_keyword(&keyword) {
            if !existing.safe_for_autoreplace || existing.originating_url.as_ref() == Some(url) {
                return;
            }
        }

        tracing::debug!(tab_id = %self.id, keyword = %keyword, osdd = %url, "Scheduling OpenSearch download");
        fetcher.schedule_download(&keyword, url, base_entry.favicon.url.as_ref(), autodetected);
    }
}
