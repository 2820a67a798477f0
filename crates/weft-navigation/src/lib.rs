//! Weft Navigation
//!
//! The back/forward list of a single tab and the identities it is keyed on:
//! - `SiteInstance` groups pages that must share a content process
//! - `NavigationEntry` is one element of the list; `page_id == -1` means "not committed"
//! - `NavigationController` owns committed, pending and transient entries and
//!   decides what a `FrameNavigate` from the content process commits

mod controller;
mod domain;
mod entry;
mod error;
mod forms;
mod params;
mod site;
mod transition;

pub use controller::{
    is_in_page_navigation, LoadCommittedDetails, NavigationController, NavigationType,
    DEFAULT_MAX_ENTRY_COUNT,
};
pub use domain::{is_public_suffix, registrable_domain, same_domain_or_host, site_for_url};
pub use entry::{file_name_for_url, Bitmap, Favicon, FeedLink, NavigationEntry, INVALID_PAGE_ID};
pub use error::NavigationError;
pub use forms::{AutofillForm, PasswordForm};
pub use params::FrameNavigateParams;
pub use site::{BrowsingInstance, SiteInstance, SiteInstanceId};
pub use transition::{PageTransition, TransitionQualifiers, TransitionType};

pub type Result<T> = std::result::Result<T, NavigationError>;
