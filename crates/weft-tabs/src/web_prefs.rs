//! Web preferences snapshot
//!
//! The immutable view of the profile's preferences that is pushed to a
//! content process whenever an observed preference changes.

use serde::{Deserialize, Serialize};

use weft_services::{pref_names, PrefService};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebPreferences {
    pub standard_font_family: String,
    pub fixed_font_family: String,
    pub serif_font_family: String,
    pub sans_serif_font_family: String,
    pub cursive_font_family: String,
    pub fantasy_font_family: String,
    pub default_font_size: i64,
    pub default_fixed_font_size: i64,
    pub minimum_font_size: i64,
    pub minimum_logical_font_size: i64,
    pub default_encoding: String,
    pub javascript_enabled: bool,
    pub javascript_can_open_windows_automatically: bool,
    pub web_security_enabled: bool,
    pub loads_images_automatically: bool,
    pub plugins_enabled: bool,
    pub java_enabled: bool,
    pub dom_paste_enabled: bool,
    pub shrinks_standalone_images_to_fit: bool,
    pub developer_extras_enabled: bool,
    pub text_areas_are_resizable: bool,
    pub uses_universal_detector: bool,
    /// Set for DOM UI pages so their bindings can run even with the user's
    /// JavaScript preference turned off.
    pub dom_ui_enabled: bool,
}

impl WebPreferences {
    pub fn from_prefs(prefs: &PrefService) -> Self {
        use pref_names::*;

        let serif = prefs.get_string(SERIF_FONT_FAMILY);
        let sans_serif = prefs.get_string(SANS_SERIF_FONT_FAMILY);
        let standard_font_family = if prefs.get_bool(STANDARD_FONT_IS_SERIF) {
            serif.clone()
        } else {
            sans_serif.clone()
        };

        Self {
            standard_font_family,
            fixed_font_family: prefs.get_string(FIXED_FONT_FAMILY),
            serif_font_family: serif,
            sans_serif_font_family: sans_serif,
            cursive_font_family: prefs.get_string(CURSIVE_FONT_FAMILY),
            fantasy_font_family: prefs.get_string(FANTASY_FONT_FAMILY),
            default_font_size: prefs.get_int(DEFAULT_FONT_SIZE),
            default_fixed_font_size: prefs.get_int(DEFAULT_FIXED_FONT_SIZE),
            minimum_font_size: prefs.get_int(MINIMUM_FONT_SIZE),
            minimum_logical_font_size: prefs.get_int(MINIMUM_LOGICAL_FONT_SIZE),
            default_encoding: prefs.get_string(DEFAULT_CHARSET),
            javascript_enabled: prefs.get_bool(JAVASCRIPT_ENABLED),
            javascript_can_open_windows_automatically: prefs.get_bool(JAVASCRIPT_CAN_OPEN_WINDOWS),
            web_security_enabled: prefs.get_bool(WEB_SECURITY_ENABLED),
            loads_images_automatically: prefs.get_bool(LOADS_IMAGES_AUTOMATICALLY),
            plugins_enabled: prefs.get_bool(PLUGINS_ENABLED),
            java_enabled: prefs.get_bool(JAVA_ENABLED),
            dom_paste_enabled: prefs.get_bool(DOM_PASTE_ENABLED),
            shrinks_standalone_images_to_fit: prefs.get_bool(SHRINKS_STANDALONE_IMAGES_TO_FIT),
            developer_extras_enabled: prefs.get_bool(DEVELOPER_EXTRAS_ENABLED),
            text_areas_are_resizable: prefs.get_bool(TEXT_AREAS_ARE_RESIZABLE),
            uses_universal_detector: prefs.get_bool(USES_UNIVERSAL_DETECTOR),
            dom_ui_enabled: false,
        }
    }

    pub fn for_dom_ui(mut self) -> Self {
        self.dom_ui_enabled = true;
        self.javascript_enabled = true;
        self
    }
}

impl Default for WebPreferences {
    fn default() -> Self {
        Self::from_prefs(&PrefService::with_browser_defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_prefs() {
        let mut prefs = PrefService::with_browser_defaults();
        prefs.set(pref_names::JAVASCRIPT_ENABLED, false).unwrap();
        prefs.set(pref_names::DEFAULT_FONT_SIZE, 20i64).unwrap();
        prefs.set(pref_names::STANDARD_FONT_IS_SERIF, false).unwrap();

        let snapshot = WebPreferences::from_prefs(&prefs);
        assert!(!snapshot.javascript_enabled);
        assert_eq!(snapshot.default_font_size, 20);
        assert_eq!(snapshot.standard_font_family, "Arial");
        assert_eq!(snapshot.default_encoding, "ISO-8859-1");
    }

    #[test]
    fn test_dom_ui_forces_javascript() {
        let mut prefs = PrefService::with_browser_defaults();
        prefs.set(pref_names::JAVASCRIPT_ENABLED, false).unwrap();

        let snapshot = WebPreferences::from_prefs(&prefs).for_dom_ui();
        assert!(snapshot.javascript_enabled);
        assert!(snapshot.dom_ui_enabled);
    }
}
