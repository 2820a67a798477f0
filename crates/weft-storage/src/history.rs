//! Browsing history and page thumbnails

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::{Database, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub visit_count: i64,
    pub last_visit_at: DateTime<Utc>,
    pub favicon_out_of_date: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryVisit {
    pub id: i64,
    pub url: String,
    pub visited_at: DateTime<Utc>,
    pub transition: u32,
    pub referrer: Option<String>,
    pub is_redirect: bool,
}

/// One committed navigation. Every URL in `redirects` except the last is
/// stored as a redirect visit; `url` is the final destination.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVisit {
    pub url: String,
    pub transition: u32,
    pub referrer: Option<String>,
    pub redirects: Vec<String>,
    pub visited_at: DateTime<Utc>,
}

impl NewVisit {
    pub fn new(url: impl Into<String>, transition: u32) -> Self {
        Self {
            url: url.into(),
            transition,
            referrer: None,
            redirects: Vec::new(),
            visited_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub boring_score: f64,
    pub good_clipping: bool,
    pub at_top: bool,
}

fn parse_time(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn page_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryPage> {
    let last_visit: String = row.get(4)?;
    Ok(HistoryPage {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        visit_count: row.get(3)?,
        last_visit_at: parse_time(&last_visit),
        favicon_out_of_date: row.get(5)?,
    })
}

const PAGE_COLUMNS: &str =
    "id, url, title, visit_count, last_visit_at, favicon_out_of_date";

fn upsert_page(conn: &Connection, url: &str, visited_at: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO history_pages (url, last_visit_at, visit_count) VALUES (?1, ?2, 1)
         ON CONFLICT(url) DO UPDATE SET
             visit_count = visit_count + 1,
             last_visit_at = excluded.last_visit_at",
        rusqlite::params![url, visited_at],
    )?;
    let id = conn.query_row(
        "SELECT id FROM history_pages WHERE url = ?1",
        [url],
        |row| row.get(0),
    )?;
    Ok(id)
}

pub struct HistoryStore {
    db: Database,
}

impl HistoryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record a committed navigation along with its redirect chain.
    pub fn add_visit(&self, visit: &NewVisit) -> Result<()> {
        let visited_at = visit.visited_at.to_rfc3339();

        self.db.transaction(|conn| {
            let mut chain: Vec<&str> = visit.redirects.iter().map(String::as_str).collect();
            if chain.last() != Some(&visit.url.as_str()) {
                chain.push(&visit.url);
            }

            let last = chain.len() - 1;
            let mut referrer = visit.referrer.clone();
            for (i, url) in chain.iter().enumerate() {
                let page_id = upsert_page(conn, url, &visited_at)?;
                conn.execute(
                    "INSERT INTO history_visits (page_id, visited_at, transition, referrer, is_redirect)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![page_id, visited_at, visit.transition, referrer, i < last],
                )?;
                referrer = Some(url.to_string());
            }
            Ok(())
        })?;

        tracing::debug!(url = %visit.url, redirects = visit.redirects.len(), "Visit recorded");
        Ok(())
    }

    /// Set the title of an already-visited page. Unknown URLs are ignored.
    pub fn set_title(&self, url: &str, title: &str) -> Result<bool> {
        self.db.with_connection(|conn| {
            let changed = conn.execute(
                "UPDATE history_pages SET title = ?1 WHERE url = ?2",
                rusqlite::params![title, url],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn mark_favicon_out_of_date(&self, url: &str) -> Result<()> {
        self.db.with_connection(|conn| {
            conn.execute(
                "UPDATE history_pages SET favicon_out_of_date = 1 WHERE url = ?1",
                [url],
            )?;
            Ok(())
        })
    }

    /// Store a thumbnail unless the existing one scores better.
    pub fn set_thumbnail(&self, url: &str, thumbnail: &Thumbnail) -> Result<bool> {
        self.db.transaction(|conn| {
            let existing: Option<f64> = conn
                .query_row(
                    "SELECT boring_score FROM thumbnails WHERE url = ?1",
                    [url],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(score) = existing {
                if score < thumbnail.boring_score {
                    return Ok(false);
                }
            }

            conn.execute(
                "INSERT OR REPLACE INTO thumbnails
                 (url, width, height, pixels, boring_score, good_clipping, at_top, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    url,
                    thumbnail.width,
                    thumbnail.height,
                    thumbnail.pixels,
                    thumbnail.boring_score,
                    thumbnail.good_clipping,
                    thumbnail.at_top,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(true)
        })
    }

    pub fn thumbnail(&self, url: &str) -> Result<Option<Thumbnail>> {
        self.db.with_connection(|conn| {
            let thumbnail = conn
                .query_row(
                    "SELECT width, height, pixels, boring_score, good_clipping, at_top
                     FROM thumbnails WHERE url = ?1",
                    [url],
                    |row| {
                        Ok(Thumbnail {
                            width: row.get(0)?,
                            height: row.get(1)?,
                            pixels: row.get(2)?,
                            boring_score: row.get(3)?,
                            good_clipping: row.get(4)?,
                            at_top: row.get(5)?,
                        })
                    },
                )
                .optional()?;
            Ok(thumbnail)
        })
    }

    pub fn page(&self, url: &str) -> Result<Option<HistoryPage>> {
        self.db.with_connection(|conn| {
            let page = conn
                .query_row(
                    &format!("SELECT {PAGE_COLUMNS} FROM history_pages WHERE url = ?1"),
                    [url],
                    page_from_row,
                )
                .optional()?;
            Ok(page)
        })
    }

    /// Visits to `url`, oldest first.
    pub fn visits_for(&self, url: &str) -> Result<Vec<HistoryVisit>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT v.id, p.url, v.visited_at, v.transition, v.referrer, v.is_redirect
                 FROM history_visits v JOIN history_pages p ON p.id = v.page_id
                 WHERE p.url = ?1
                 ORDER BY v.id",
            )?;

            let visits = stmt
                .query_map([url], |row| {
                    let visited: String = row.get(2)?;
                    Ok(HistoryVisit {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        visited_at: parse_time(&visited),
                        transition: row.get(3)?,
                        referrer: row.get(4)?,
                        is_redirect: row.get(5)?,
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();
            Ok(visits)
        })
    }

    /// Search page URLs and titles, most recent first.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<HistoryPage>> {
        self.db.with_connection(|conn| {
            let pattern = format!("%{}%", query.to_lowercase());
            let mut stmt = conn.prepare(&format!(
                "SELECT {PAGE_COLUMNS} FROM history_pages
                 WHERE LOWER(url) LIKE ?1 OR LOWER(title) LIKE ?1
                 ORDER BY last_visit_at DESC, visit_count DESC
                 LIMIT ?2"
            ))?;

            let pages = stmt
                .query_map(rusqlite::params![pattern, limit as i64], page_from_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(pages)
        })
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryPage>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PAGE_COLUMNS} FROM history_pages
                 ORDER BY last_visit_at DESC, id DESC
                 LIMIT ?1"
            ))?;

            let pages = stmt
                .query_map([limit as i64], page_from_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(pages)
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.db.transaction(|conn| {
            conn.execute("DELETE FROM history_visits", [])?;
            conn.execute("DELETE FROM history_pages", [])?;
            conn.execute("DELETE FROM thumbnails", [])?;
            Ok(())
        })?;
        tracing::info!("History cleared");
        Ok(())
    }
}

impl Clone for HistoryStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
