//! Weft Services
//!
//! Everything a tab talks to that it does not own:
//! - process-wide services shared by all tabs (notification bus, cross-site
//!   request registry, hung-renderer UI, last search string, clock, shutdown)
//! - the contracts of the auxiliary services wired to each profile
//! - the profile and its preference store

mod bookmarks;
mod cancel;
mod clock;
mod dialogs;
mod downloads;
mod error;
mod favicon;
mod history;
mod hung;
mod keyword;
mod notification;
mod password;
mod prefs;
mod print;
mod process;
mod profile;
mod registry;
mod search;
mod shutdown;
mod types;

pub use bookmarks::BookmarkService;
pub use cancel::CancelToken;
pub use clock::{Clock, ManualClock, SystemClock};
pub use dialogs::{
    FileChooserRequest, FileDialogService, JsDialogKind, JsDialogPresenter, JsDialogRequest,
    ShortcutInstaller, ShortcutRequest,
};
pub use downloads::{is_savable_contents, DownloadService, SavePackageService, SaveRequest};
pub use error::ServiceError;
pub use favicon::FaviconService;
pub use history::{AddPageRequest, HistoryService, ThumbnailScore};
pub use hung::{HungRendererTracker, HungRendererUi};
pub use keyword::{generate_favicon_url, generate_keyword, KeywordFetcher, KeywordModel, TemplateUrl};
pub use notification::{
    FindResult, LoadDetails, Notification, NotificationBus, NotificationDetails, NotificationKind,
    NotificationSource, ProvisionalLoadDetails,
};
pub use password::{AutofillManager, PasswordManager, MAX_AUTOFILL_SUGGESTIONS};
pub use prefs::{pref_names, PrefService, PrefValue, OBSERVED_PREFS};
pub use print::PrintService;
pub use process::{DevTools, ProcessServices, ResourceLoader, WebCache};
pub use profile::{Profile, ProfileServices};
pub use registry::CrossSiteRequestRegistry;
pub use search::LastSearchString;
pub use shutdown::ShutdownSignal;
pub use types::{EndpointId, GlobalRequestId, Rect, TabId};

pub type Result<T> = std::result::Result<T, ServiceError>;
