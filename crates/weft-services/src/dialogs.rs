//! User-facing dialog contracts: JavaScript message boxes, file choosers and
//! application shortcuts

use std::path::PathBuf;

use url::Url;

use weft_navigation::Bitmap;

use crate::cancel::CancelToken;
use crate::types::TabId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsDialogKind {
    Alert,
    Confirm,
    Prompt,
    BeforeUnload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsDialogRequest {
    pub tab: TabId,
    /// Echoed back by the shell when the dialog closes.
    pub dialog_id: u64,
    pub kind: JsDialogKind,
    pub message: String,
    pub default_prompt: String,
    pub frame_url: Option<Url>,
    pub show_suppress_checkbox: bool,
}

/// Shows modal JavaScript dialogs. The shell reports the outcome back to the
/// tab with the request's `dialog_id`.
pub trait JsDialogPresenter: Send + Sync {
    fn show(&self, request: JsDialogRequest);
}

#[derive(Debug, Clone)]
pub struct FileChooserRequest {
    pub tab: TabId,
    pub multiple: bool,
    pub title: String,
    pub default_file: Option<PathBuf>,
    /// Cancelled when the tab goes away before the user picks.
    pub cancel: CancelToken,
}

/// Opens a file chooser. The shell reports the selection (or cancel) back to
/// the tab.
pub trait FileDialogService: Send + Sync {
    fn select_file(&self, request: FileChooserRequest);
}

#[derive(Debug, Clone)]
pub struct ShortcutRequest {
    pub tab: TabId,
    pub url: Url,
    pub title: String,
    pub description: String,
    pub icon: Bitmap,
    pub cancel: CancelToken,
}

pub trait ShortcutInstaller: Send + Sync {
    fn install(&self, request: ShortcutRequest);
}
