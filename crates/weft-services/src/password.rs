//! Password manager and autofill contracts

use weft_navigation::{AutofillForm, PasswordForm};

use crate::types::TabId;

/// Upper bound on suggestions offered under a text field.
pub const MAX_AUTOFILL_SUGGESTIONS: usize = 6;

/// Captures credentials submitted in a tab. Calls come only from the tab.
pub trait PasswordManager: Send + Sync {
    fn forms_seen(&self, tab: TabId, forms: &[PasswordForm]);
    fn provisionally_save(&self, tab: TabId, form: &PasswordForm);
    fn clear_provisional(&self, tab: TabId);
    /// A user-initiated main-frame load committed without a submitted form.
    fn did_navigate(&self, tab: TabId);
    /// Loading finished; a provisional save may now be offered.
    fn did_stop_loading(&self, tab: TabId);
}

pub trait AutofillManager: Send + Sync {
    fn form_submitted(&self, form: &AutofillForm);
    /// At most `limit` stored values for `field_name` starting with `prefix`.
    fn suggestions(&self, field_name: &str, prefix: &str, limit: usize) -> Vec<String>;
    fn remove_entry(&self, field_name: &str, value: &str);
}
