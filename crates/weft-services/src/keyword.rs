//! Search keyword model and OpenSearch description fetcher contracts

use url::Url;

/// A search engine the location bar can dispatch keyword searches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUrl {
    pub keyword: String,
    pub short_name: String,
    /// Search URL template.
    pub url: String,
    pub input_encodings: Vec<String>,
    pub favicon_url: Option<Url>,
    /// OSDD this engine was created from, if any.
    pub originating_url: Option<Url>,
    /// Created automatically and may be replaced without asking the user.
    pub safe_for_autoreplace: bool,
}

impl TemplateUrl {
    pub fn new(keyword: &str, url: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            short_name: keyword.to_string(),
            url: url.to_string(),
            input_encodings: Vec::new(),
            favicon_url: None,
            originating_url: None,
            safe_for_autoreplace: false,
        }
    }
}

pub trait KeywordModel: Send + Sync {
    fn is_loaded(&self) -> bool;
    /// Starts loading; callers retry on a later event.
    fn load(&self);
    fn template_url_for_keyword(&self, keyword: &str) -> Option<TemplateUrl>;
    /// Whether `keyword` may be (re)assigned to `url`.
    fn can_replace_keyword(&self, keyword: &str, url: &str) -> bool;
    fn add(&self, template_url: TemplateUrl);
    fn remove(&self, keyword: &str);
}

pub trait KeywordFetcher: Send + Sync {
    fn schedule_download(
        &self,
        keyword: &str,
        osdd_url: &Url,
        favicon_url: Option<&Url>,
        autodetected: bool,
    );
}

/// Derives a search keyword from the URL the user reached a search page from.
/// Autodetected keywords only come from plain `http` host roots.
pub fn generate_keyword(url: &Url, autodetected: bool) -> String {
    if autodetected
        && (url.query().is_some()
            || url.scheme() != "http"
            || !(url.path().is_empty() || url.path() == "/"))
    {
        return String::new();
    }

    let host = url.host_str().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

/// Guess at a site's icon when the page never declared one.
pub fn generate_favicon_url(page: &Url) -> Option<Url> {
    let host = page.host_str()?;
    Url::parse(&format!("{}://{}/favicon.ico", page.scheme(), host)).ok()
}
