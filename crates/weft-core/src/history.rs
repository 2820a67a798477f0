//! History service backed by the SQLite history store.
//!
//! Tabs report history fire-and-forget, so storage failures are logged
//! here rather than returned.

use url::Url;

use weft_navigation::Bitmap;
use weft_services::{AddPageRequest, HistoryService, ThumbnailScore};
use weft_storage::{Database, HistoryStore, NewVisit, Thumbnail};

pub struct SqliteHistory {
    store: HistoryStore,
}

impl SqliteHistory {
    pub fn new(db: Database) -> Self {
        Self {
            store: HistoryStore::new(db),
        }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }
}

impl HistoryService for SqliteHistory {
    fn add_page(&self, request: AddPageRequest) {
        let mut visit = NewVisit::new(request.url.as_str(), request.transition.bits());
        visit.referrer = request.referrer.map(String::from);
        visit.redirects = request.redirects.into_iter().map(String::from).collect();
        if let Err(e) = self.store.add_visit(&visit) {
            tracing::warn!(tab_id = %request.tab, url = %request.url, error = %e, "Failed to record visit");
        }
    }

    fn set_page_title(&self, url: &Url, title: &str) {
        match self.store.set_title(url.as_str(), title) {
            Ok(true) => {}
            Ok(false) => tracing::debug!(url = %url, "Title for a page not in history"),
            Err(e) => tracing::warn!(url = %url, error = %e, "Failed to store page title"),
        }
    }

    fn set_page_thumbnail(&self, url: &Url, bitmap: &Bitmap, score: ThumbnailScore) {
        let thumbnail = Thumbnail {
            width: bitmap.width,
            height: bitmap.height,
            pixels: bitmap.pixels.clone(),
            boring_score: score.boring_score,
            good_clipping: score.good_clipping,
            at_top: score.at_top,
        };
        if let Err(e) = self.store.set_thumbnail(url.as_str(), &thumbnail) {
            tracing::warn!(url = %url, error = %e, "Failed to store thumbnail");
        }
    }

    fn set_favicon_out_of_date(&self, url: &Url) {
        if let Err(e) = self.store.mark_favicon_out_of_date(url.as_str()) {
            tracing::warn!(url = %url, error = %e, "Failed to mark favicon out of date");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_navigation::{PageTransition, TransitionType};
    use weft_services::TabId;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn request(target: &str) -> AddPageRequest {
        AddPageRequest {
            url: url(target),
            tab: TabId::new(),
            page_id: 1,
            referrer: None,
            transition: PageTransition::new(TransitionType::Typed),
            redirects: Vec::new(),
        }
    }

    #[test]
    fn test_add_page_records_visit_and_title() {
        let history = SqliteHistory::new(Database::open_in_memory().unwrap());
        history.add_page(request("https://example.com/"));
        history.set_page_title(&url("https://example.com/"), "Example");

        let page = history.store().page("https://example.com/").unwrap().unwrap();
        assert_eq!(page.title, "Example");
        assert_eq!(page.visit_count, 1);

        let visits = history.store().visits_for("https://example.com/").unwrap();
        assert_eq!(
            visits[0].transition,
            PageTransition::new(TransitionType::Typed).bits()
        );
    }

    #[test]
    fn test_redirect_chain_is_stored() {
        let history = SqliteHistory::new(Database::open_in_memory().unwrap());
        let mut req = request("https://example.com/final");
        req.referrer = Some(url("https://ref.example/"));
        req.redirects = vec![url("https://example.com/start"), url("https://example.com/final")];
        history.add_page(req);

        assert!(history.store().page("https://example.com/start").unwrap().is_some());
        let visits = history.store().visits_for("https://example.com/final").unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].referrer.as_deref(), Some("https://example.com/start"));
    }

    #[test]
    fn test_title_for_unknown_page_is_ignored() {
        let history = SqliteHistory::new(Database::open_in_memory().unwrap());
        history.set_page_title(&url("https://nowhere.example/"), "Nothing");
        assert!(history.store().page("https://nowhere.example/").unwrap().is_none());
    }

    #[test]
    fn test_thumbnail_and_favicon() {
        let history = SqliteHistory::new(Database::open_in_memory().unwrap());
        let page = url("https://example.com/");
        history.add_page(request(page.as_str()));

        let score = ThumbnailScore {
            boring_score: 0.2,
            good_clipping: true,
            at_top: true,
        };
        history.set_page_thumbnail(&page, &Bitmap::new(2, 1, vec![0; 8]), score);
        history.set_favicon_out_of_date(&page);

        let thumbnail = history.store().thumbnail(page.as_str()).unwrap().unwrap();
        assert_eq!((thumbnail.width, thumbnail.height), (2, 1));
        assert!(thumbnail.good_clipping);
        assert!(history.store().page(page.as_str()).unwrap().unwrap().favicon_out_of_date);
    }
}
