//! Pluggable document search.
//!
//! A provider turns a keyword into an ordered list of candidates and, when the
//! candidate is not already a download URL, resolves it to one.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use miner_logging::{miner_debug, miner_warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

pub const ARCHIVE_BASE_URL: &str = "https://archive.org";
pub const GOOGLE_BASE_URL: &str = "https://www.googleapis.com";

/// Custom Search returns at most ten items per page and refuses `start` beyond 91.
const GOOGLE_PAGE_SIZE: usize = 10;
const GOOGLE_MAX_START: usize = 91;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Provider-specific identifier, or the document URL itself.
    pub locator: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search provider unreachable: {0}")]
    Unreachable(String),
    #[error("search provider answered with http status {0}")]
    HttpStatus(u16),
    #[error("search provider is rate limiting requests")]
    RateLimited,
    #[error("unexpected search response: {0}")]
    Decode(String),
    #[error("search provider is not configured: {0}")]
    NotConfigured(&'static str),
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError>;

    /// Download URL for a candidate; `None` when it has no PDF to offer.
    async fn resolve(&self, result: &SearchResult) -> Result<Option<String>, SearchError> {
        Ok(Some(result.locator.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Archive,
    Google,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Archive => "archive",
            ProviderKind::Google => "google",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "archive" | "archive.org" => Ok(ProviderKind::Archive),
            "google" => Ok(ProviderKind::Google),
            other => Err(format!("unknown search provider {other:?}")),
        }
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| SearchError::Unreachable(err.to_string()))
}

async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: Url) -> Result<T, SearchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| SearchError::Unreachable(err.to_string()))?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(SearchError::RateLimited);
    }
    if !status.is_success() {
        return Err(SearchError::HttpStatus(status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|err| SearchError::Unreachable(err.to_string()))?;
    serde_json::from_slice(&body).map_err(|err| SearchError::Decode(err.to_string()))
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, SearchError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| SearchError::NotConfigured("base url cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn parse_base(base_url: &str) -> Result<Url, SearchError> {
    Url::parse(base_url).map_err(|_| SearchError::NotConfigured("invalid base url"))
}

// ---------------------------------------------------------------------------
// Archive.org
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AdvancedSearchBody {
    #[serde(default)]
    response: AdvancedSearchResponse,
}

#[derive(Debug, Default, Deserialize)]
struct AdvancedSearchResponse {
    #[serde(default)]
    docs: Vec<ArchiveDoc>,
}

#[derive(Debug, Deserialize)]
struct ArchiveDoc {
    identifier: String,
    #[serde(default)]
    title: Option<TitleField>,
}

/// Archive.org returns `title` either as a string or as a list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TitleField {
    One(String),
    Many(Vec<String>),
}

impl TitleField {
    fn into_title(self) -> Option<String> {
        match self {
            TitleField::One(title) => Some(title),
            TitleField::Many(titles) => titles.into_iter().next(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetadataBody {
    #[serde(default)]
    files: Vec<MetadataFile>,
}

#[derive(Debug, Deserialize)]
struct MetadataFile {
    #[serde(default)]
    name: String,
}

/// Archive.org advanced search restricted to PDF items, resolved through the
/// per-item metadata API.
#[derive(Debug, Clone)]
pub struct ArchiveOrgSearch {
    client: reqwest::Client,
    base: Url,
}

impl ArchiveOrgSearch {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(timeout)?,
            base: parse_base(base_url)?,
        })
    }
}

#[async_trait::async_trait]
impl SearchProvider for ArchiveOrgSearch {
    fn name(&self) -> &'static str {
        "archive.org"
    }

    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let mut url = endpoint(&self.base, &["advancedsearch.php"])?;
        url.query_pairs_mut()
            .append_pair("q", &format!("({keyword}) AND format:PDF"))
            .append_pair("fl[]", "identifier,title")
            .append_pair("rows", &limit.to_string())
            .append_pair("output", "json");

        let body: AdvancedSearchBody = get_json(&self.client, url).await?;
        let results: Vec<SearchResult> = body
            .response
            .docs
            .into_iter()
            .take(limit)
            .map(|doc| {
                let title = doc
                    .title
                    .and_then(TitleField::into_title)
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| doc.identifier.clone());
                SearchResult {
                    locator: doc.identifier,
                    title,
                }
            })
            .collect();
        miner_debug!("archive.org returned {} items for {:?}", results.len(), keyword);
        Ok(results)
    }

    async fn resolve(&self, result: &SearchResult) -> Result<Option<String>, SearchError> {
        let url = endpoint(&self.base, &["metadata", &result.locator])?;
        let body: MetadataBody = get_json(&self.client, url).await?;
        let Some(file) = body
            .files
            .into_iter()
            .find(|f| f.name.to_ascii_lowercase().ends_with(".pdf"))
        else {
            return Ok(None);
        };
        // File names may sit in subdirectories of the item.
        let mut segments = vec!["download", result.locator.as_str()];
        segments.extend(file.name.split('/').filter(|part| !part.is_empty()));
        let download = endpoint(&self.base, &segments)?;
        Ok(Some(download.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Google Custom Search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CustomSearchBody {
    #[serde(default)]
    items: Vec<CustomSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchItem {
    link: String,
    #[serde(default)]
    title: String,
}

/// Google Custom Search JSON API, keeping only links that point at `.pdf` files.
#[derive(Debug, Clone)]
pub struct GoogleSearch {
    client: reqwest::Client,
    base: Url,
    api_key: String,
    engine_id: String,
}

impl GoogleSearch {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let api_key = api_key.into();
        let engine_id = engine_id.into();
        if api_key.trim().is_empty() {
            return Err(SearchError::NotConfigured("missing api key"));
        }
        if engine_id.trim().is_empty() {
            return Err(SearchError::NotConfigured("missing search engine id"));
        }
        Ok(Self {
            client: build_client(timeout)?,
            base: parse_base(base_url)?,
            api_key,
            engine_id,
        })
    }

    fn page_url(&self, keyword: &str, start: usize) -> Result<Url, SearchError> {
        let mut url = endpoint(&self.base, &["customsearch", "v1"])?;
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("cx", &self.engine_id)
            .append_pair("q", &format!("{keyword} filetype:pdf"))
            .append_pair("num", &GOOGLE_PAGE_SIZE.to_string())
            .append_pair("start", &start.to_string());
        Ok(url)
    }
}

#[async_trait::async_trait]
impl SearchProvider for GoogleSearch {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn search(&self, keyword: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let mut results = Vec::new();
        let mut start = 1;
        while results.len() < limit && start <= GOOGLE_MAX_START {
            let url = self.page_url(keyword, start)?;
            let page: CustomSearchBody = match get_json(&self.client, url).await {
                Ok(page) => page,
                Err(err) if !results.is_empty() => {
                    miner_warn!("google search stopped after {} results: {}", results.len(), err);
                    break;
                }
                Err(err) => return Err(err),
            };
            if page.items.is_empty() {
                break;
            }
            for item in page.items {
                if results.len() == limit {
                    break;
                }
                if !is_pdf_link(&item.link) {
                    continue;
                }
                let title = if item.title.trim().is_empty() {
                    item.link.clone()
                } else {
                    item.title
                };
                results.push(SearchResult {
                    locator: item.link,
                    title,
                });
            }
            start += GOOGLE_PAGE_SIZE;
        }
        Ok(results)
    }
}

/// True when the link path ends in `.pdf`, ignoring case, query and fragment.
pub fn is_pdf_link(link: &str) -> bool {
    match Url::parse(link) {
        Ok(url) => url.path().to_ascii_lowercase().ends_with(".pdf"),
        Err(_) => link
            .split(['?', '#'])
            .next()
            .is_some_and(|path| path.to_ascii_lowercase().ends_with(".pdf")),
    }
}
