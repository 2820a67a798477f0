//! Preference store
//!
//! Preferences are registered with a typed default before use. Setting a
//! value of the wrong type, or an unregistered name, is an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::Result;

pub mod pref_names {
    pub const ALTERNATE_ERROR_PAGES_ENABLED: &str = "alternate_error_pages.enabled";
    pub const DEFAULT_CHARSET: &str = "intl.charset_default";
    pub const ACCEPT_LANGUAGES: &str = "intl.accept_languages";

    pub const JAVASCRIPT_ENABLED: &str = "webkit.webprefs.javascript_enabled";
    pub const JAVASCRIPT_CAN_OPEN_WINDOWS: &str =
        "webkit.webprefs.javascript_can_open_windows_automatically";
    pub const WEB_SECURITY_ENABLED: &str = "webkit.webprefs.web_security_enabled";
    pub const LOADS_IMAGES_AUTOMATICALLY: &str = "webkit.webprefs.loads_images_automatically";
    pub const PLUGINS_ENABLED: &str = "webkit.webprefs.plugins_enabled";
    pub const JAVA_ENABLED: &str = "webkit.webprefs.java_enabled";
    pub const DOM_PASTE_ENABLED: &str = "webkit.webprefs.dom_paste_enabled";
    pub const SHRINKS_STANDALONE_IMAGES_TO_FIT: &str =
        "webkit.webprefs.shrinks_standalone_images_to_fit";
    pub const DEVELOPER_EXTRAS_ENABLED: &str = "webkit.webprefs.developer_extras_enabled";
    pub const TEXT_AREAS_ARE_RESIZABLE: &str = "webkit.webprefs.text_areas_are_resizable";
    pub const USES_UNIVERSAL_DETECTOR: &str = "webkit.webprefs.uses_universal_detector";
    pub const STANDARD_FONT_IS_SERIF: &str = "webkit.webprefs.standard_font_is_serif";
    pub const SERIF_FONT_FAMILY: &str = "webkit.webprefs.serif_font_family";
    pub const SANS_SERIF_FONT_FAMILY: &str = "webkit.webprefs.sansserif_font_family";
    pub const FIXED_FONT_FAMILY: &str = "webkit.webprefs.fixed_font_family";
    pub const CURSIVE_FONT_FAMILY: &str = "webkit.webprefs.cursive_font_family";
    pub const FANTASY_FONT_FAMILY: &str = "webkit.webprefs.fantasy_font_family";
    pub const DEFAULT_FONT_SIZE: &str = "webkit.webprefs.default_font_size";
    pub const DEFAULT_FIXED_FONT_SIZE: &str = "webkit.webprefs.default_fixed_font_size";
    pub const MINIMUM_FONT_SIZE: &str = "webkit.webprefs.minimum_font_size";
    pub const MINIMUM_LOGICAL_FONT_SIZE: &str = "webkit.webprefs.minimum_logical_font_size";
}

/// Preferences whose change makes every tab rebuild and push its
/// web preferences.
pub const OBSERVED_PREFS: &[&str] = &[
    pref_names::ALTERNATE_ERROR_PAGES_ENABLED,
    pref_names::JAVA_ENABLED,
    pref_names::JAVASCRIPT_ENABLED,
    pref_names::LOADS_IMAGES_AUTOMATICALLY,
    pref_names::PLUGINS_ENABLED,
    pref_names::USES_UNIVERSAL_DETECTOR,
    pref_names::SERIF_FONT_FAMILY,
    pref_names::SANS_SERIF_FONT_FAMILY,
    pref_names::FIXED_FONT_FAMILY,
    pref_names::DEFAULT_FONT_SIZE,
    pref_names::DEFAULT_FIXED_FONT_SIZE,
    pref_names::DEFAULT_CHARSET,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl PrefValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::String(_) => "string",
        }
    }

    fn same_type(&self, other: &PrefValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PrefValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrefService {
    defaults: HashMap<String, PrefValue>,
    user_values: HashMap<String, PrefValue>,
}

impl PrefService {
    /// An empty store; nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with every preference a tab reads registered at its default.
    pub fn with_browser_defaults() -> Self {
        use pref_names::*;

        let mut prefs = Self::new();
        prefs.register(ALTERNATE_ERROR_PAGES_ENABLED, true);
        prefs.register(DEFAULT_CHARSET, "ISO-8859-1");
        prefs.register(ACCEPT_LANGUAGES, "en-US,en");

        prefs.register(JAVASCRIPT_ENABLED, true);
        prefs.register(JAVASCRIPT_CAN_OPEN_WINDOWS, true);
        prefs.register(WEB_SECURITY_ENABLED, true);
        prefs.register(LOADS_IMAGES_AUTOMATICALLY, true);
        prefs.register(PLUGINS_ENABLED, true);
        prefs.register(JAVA_ENABLED, true);
        prefs.register(DOM_PASTE_ENABLED, false);
        prefs.register(SHRINKS_STANDALONE_IMAGES_TO_FIT, true);
        prefs.register(DEVELOPER_EXTRAS_ENABLED, true);
        prefs.register(TEXT_AREAS_ARE_RESIZABLE, true);
        prefs.register(USES_UNIVERSAL_DETECTOR, false);
        prefs.register(STANDARD_FONT_IS_SERIF, true);
        prefs.register(SERIF_FONT_FAMILY, "Times New Roman");
        prefs.register(SANS_SERIF_FONT_FAMILY, "Arial");
        prefs.register(FIXED_FONT_FAMILY, "Courier New");
        prefs.register(CURSIVE_FONT_FAMILY, "Script");
        prefs.register(FANTASY_FONT_FAMILY, "Impact");
        prefs.register(DEFAULT_FONT_SIZE, 16i64);
        prefs.register(DEFAULT_FIXED_FONT_SIZE, 13i64);
        prefs.register(MINIMUM_FONT_SIZE, 0i64);
        prefs.register(MINIMUM_LOGICAL_FONT_SIZE, 6i64);
        prefs
    }

    pub fn register(&mut self, name: &str, default: impl Into<PrefValue>) {
        self.defaults.insert(name.to_string(), default.into());
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.defaults.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&PrefValue> {
        self.user_values.get(name).or_else(|| self.defaults.get(name))
    }

    pub fn get_bool(&self, name: &str) -> bool {
        matches!(self.get(name), Some(PrefValue::Bool(true)))
    }

    pub fn get_int(&self, name: &str) -> i64 {
        match self.get(name) {
            Some(PrefValue::Int(value)) => *value,
            _ => 0,
        }
    }

    pub fn get_string(&self, name: &str) -> String {
        match self.get(name) {
            Some(PrefValue::String(value)) => value.clone(),
            _ => String::new(),
        }
    }

    /// Stores a user value. Returns whether the effective value changed.
    pub fn set(&mut self, name: &str, value: impl Into<PrefValue>) -> Result<bool> {
        let value = value.into();
        let default = self
            .defaults
            .get(name)
            .ok_or_else(|| ServiceError::UnknownPref(name.to_string()))?;
        if !default.same_type(&value) {
            return Err(ServiceError::PrefTypeMismatch {
                name: name.to_string(),
                expected: default.type_name(),
            });
        }

        let changed = self.get(name) != Some(&value);
        if *default == value {
            self.user_values.remove(name);
        } else {
            self.user_values.insert(name.to_string(), value);
        }
        Ok(changed)
    }

    /// Values that differ from their defaults, for persistence.
    pub fn user_values(&self) -> impl Iterator<Item = (&str, &PrefValue)> {
        self.user_values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Loads persisted values. Unknown or mistyped entries are skipped.
    pub fn load_user_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, PrefValue)>,
    {
        for (name, value) in values {
            if let Err(e) = self.set(&name, value) {
                tracing::warn!(pref = %name, error = %e, "Ignoring stored preference");
            }
        }
    }
}
