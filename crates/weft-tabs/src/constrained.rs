//! Constrained windows: modal popups scoped to one tab

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstrainedWindowId(u64);

impl ConstrainedWindowId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConstrainedWindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub trait ConstrainedWindow: Send {
    /// The tab has already removed the window from its list.
    fn close(&mut self);

    fn was_hidden(&mut self) {}

    fn did_become_selected(&mut self) {}
}
