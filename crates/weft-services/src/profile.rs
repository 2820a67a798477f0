//! Profiles
//!
//! A profile bundles the preference store with the auxiliary services its
//! tabs use. Every service is optional; a missing service is skipped.

use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::bookmarks::BookmarkService;
use crate::dialogs::{FileDialogService, JsDialogPresenter, ShortcutInstaller};
use crate::downloads::{DownloadService, SavePackageService};
use crate::favicon::FaviconService;
use crate::history::HistoryService;
use crate::keyword::{KeywordFetcher, KeywordModel};
use crate::password::{AutofillManager, PasswordManager};
use crate::prefs::PrefService;
use crate::print::PrintService;

#[derive(Clone, Default)]
pub struct ProfileServices {
    pub password_manager: Option<Arc<dyn PasswordManager>>,
    pub autofill: Option<Arc<dyn AutofillManager>>,
    pub favicons: Option<Arc<dyn FaviconService>>,
    pub keyword_model: Option<Arc<dyn KeywordModel>>,
    pub keyword_fetcher: Option<Arc<dyn KeywordFetcher>>,
    pub history: Option<Arc<dyn HistoryService>>,
    pub downloads: Option<Arc<dyn DownloadService>>,
    pub bookmarks: Option<Arc<dyn BookmarkService>>,
    pub print: Option<Arc<dyn PrintService>>,
    pub save_package: Option<Arc<dyn SavePackageService>>,
    pub shortcuts: Option<Arc<dyn ShortcutInstaller>>,
    pub file_dialogs: Option<Arc<dyn FileDialogService>>,
    pub js_dialogs: Option<Arc<dyn JsDialogPresenter>>,
}

pub struct Profile {
    id: Uuid,
    incognito: bool,
    prefs: Arc<RwLock<PrefService>>,
    services: ProfileServices,
}

impl Profile {
    pub fn new(prefs: PrefService, services: ProfileServices) -> Self {
        Self {
            id: Uuid::new_v4(),
            incognito: false,
            prefs: Arc::new(RwLock::new(prefs)),
            services,
        }
    }

    /// An off-the-record profile sharing `self`'s preferences. History is
    /// never recorded for it.
    pub fn incognito(&self) -> Self {
        let mut services = self.services.clone();
        services.history = None;
        Self {
            id: Uuid::new_v4(),
            incognito: true,
            prefs: Arc::clone(&self.prefs),
            services,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_incognito(&self) -> bool {
        self.incognito
    }

    pub fn prefs(&self) -> &Arc<RwLock<PrefService>> {
        &self.prefs
    }

    pub fn services(&self) -> &ProfileServices {
        &self.services
    }

    /// History, unless this profile is incognito.
    pub fn history(&self) -> Option<&Arc<dyn HistoryService>> {
        if self.incognito {
            return None;
        }
        self.services.history.as_ref()
    }

    pub fn same_profile(&self, id: Uuid) -> bool {
        self.id == id
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new(PrefService::with_browser_defaults(), ProfileServices::default())
    }
}
