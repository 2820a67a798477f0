//! Last find-in-page search string, shared by all tabs

use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Clone, Default)]
pub struct LastSearchString {
    value: Arc<RwLock<String>>,
}

impl LastSearchString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> String {
        self.value.read().clone()
    }

    pub fn set(&self, search: &str) {
        *self.value.write() = search.to_string();
    }
}
