//! Infobars

use weft_navigation::LoadCommittedDetails;

pub trait InfoBarDelegate: Send {
    fn message(&self) -> String;

    /// Whether the bar should go away after `details` committed.
    fn should_expire(&self, details: &LoadCommittedDetails) -> bool;

    /// Called exactly once, when the tab drops the bar.
    fn info_bar_closed(&mut self) {}

    /// Duplicates are not added twice.
    fn equals(&self, _other: &dyn InfoBarDelegate) -> bool {
        false
    }
}

/// A plain text bar that expires on the next user-initiated page load.
pub struct AlertInfoBar {
    message: String,
    page_id: i32,
}

impl AlertInfoBar {
    pub fn new(message: impl Into<String>, page_id: i32) -> Self {
        Self {
            message: message.into(),
            page_id,
        }
    }
}

impl InfoBarDelegate for AlertInfoBar {
    fn message(&self) -> String {
        self.message.clone()
    }

    fn should_expire(&self, details: &LoadCommittedDetails) -> bool {
        details.is_user_initiated_main_frame_load() && details.entry.page_id != self.page_id
    }

    fn equals(&self, other: &dyn InfoBarDelegate) -> bool {
        self.message == other.message()
    }
}
