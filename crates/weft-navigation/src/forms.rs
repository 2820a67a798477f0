//! Form descriptions reported by the content process

use serde::{Deserialize, Serialize};
use url::Url;

/// A login form seen on (or submitted from) a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordForm {
    /// The page the form lives on, without query or fragment.
    pub origin: Url,
    pub action: Option<Url>,
    pub username_element: String,
    pub username_value: String,
    pub password_element: String,
    pub password_value: String,
    pub submit_element: String,
}

impl PasswordForm {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            action: None,
            username_element: String::new(),
            username_value: String::new(),
            password_element: String::new(),
            password_value: String::new(),
            submit_element: String::new(),
        }
    }

    /// A submitted form is worth saving only if it carries a password.
    pub fn has_credentials(&self) -> bool {
        !self.password_value.is_empty()
    }
}

/// A submitted form's field values, fed to autofill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutofillForm {
    pub fields: Vec<(String, String)>,
}

impl AutofillForm {
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.is_empty())
    }
}
