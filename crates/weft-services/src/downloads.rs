//! Download manager and save-package contracts

use std::path::PathBuf;

use url::Url;

use crate::cancel::CancelToken;
use crate::types::TabId;

const SAVABLE_MIME_TYPES: &[&str] = &[
    "text/html",
    "text/xml",
    "application/xhtml+xml",
    "text/plain",
    "text/css",
    "application/javascript",
    "text/javascript",
];

/// True if "save page" can write this document with its resources. Other
/// documents are downloaded instead.
pub fn is_savable_contents(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    SAVABLE_MIME_TYPES.contains(&essence.as_str())
}

pub trait DownloadService: Send + Sync {
    fn in_progress_count(&self) -> usize;
    fn download_url(&self, tab: TabId, url: &Url, referrer: Option<&Url>);
}

#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub tab: TabId,
    pub page_url: Url,
    pub title: String,
    /// Preselected destination; `None` prompts the user.
    pub main_file: Option<PathBuf>,
    pub dir_path: Option<PathBuf>,
    /// Cancelled when the tab starts another save or closes.
    pub cancel: CancelToken,
}

pub trait SavePackageService: Send + Sync {
    fn save(&self, request: SaveRequest);
}
