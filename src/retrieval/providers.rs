// External answer providers
// Ordered fallback tier behind the local index: a fast instant-answer
// service first, then an encyclopedia summary lookup with one search retry

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

const USER_AGENT: &str = "strata/0.3 (adaptive query router)";

const DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com";
/// Per-call budget for the instant-answer service; it is the fast tier.
const DUCKDUCKGO_TIMEOUT: Duration = Duration::from_millis(1500);

const WIKIPEDIA_REST_URL: &str = "https://en.wikipedia.org/api/rest_v1";
const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
/// Per-call budget for each encyclopedia request.
const WIKIPEDIA_TIMEOUT: Duration = Duration::from_millis(2000);
/// Worst case for the encyclopedia tier: direct lookup, search, retry.
const WIKIPEDIA_MAX_CALLS: u32 = 3;

/// An answer pulled from an external source.
#[derive(Debug, Clone)]
pub struct ProviderAnswer {
    pub text: String,
    pub confidence: f64,
    pub source: String,
}

/// One external tier of the retrieval cascade.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Hard wall-clock cap for one resolve attempt, covering every request
    /// the provider makes. The cascade enforces it with a timeout, so a
    /// hung provider can never block a query past its budget.
    fn budget(&self) -> Duration;

    /// Ok(None) means the provider had nothing for this query; Err means it
    /// misbehaved (timeout, network, malformed payload). Both advance the
    /// cascade to the next tier.
    async fn fetch(&self, query: &str) -> Result<Option<ProviderAnswer>>;
}

// ---------------------------------------------------------------------------
// DuckDuckGo instant answers

#[derive(Debug, Deserialize)]
struct InstantAnswer {
    #[serde(default, rename = "AbstractText")]
    abstract_text: String,
    #[serde(default, rename = "Answer")]
    answer: String,
    #[serde(default, rename = "Definition")]
    definition: String,
}

pub struct DuckDuckGoProvider {
    client: Client,
    base_url: String,
}

impl DuckDuckGoProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DUCKDUCKGO_URL)
    }

    /// Point at a different endpoint; tests use this against a local server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DUCKDUCKGO_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl AnswerProvider for DuckDuckGoProvider {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    fn budget(&self) -> Duration {
        DUCKDUCKGO_TIMEOUT
    }

    async fn fetch(&self, query: &str) -> Result<Option<ProviderAnswer>> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .context("instant answer request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("instant answer returned {}", response.status());
        }

        let payload: InstantAnswer = response
            .json()
            .await
            .context("malformed instant answer payload")?;

        let text = [payload.abstract_text, payload.answer, payload.definition]
            .into_iter()
            .find(|t| !t.trim().is_empty());

        Ok(text.map(|text| ProviderAnswer {
            text,
            confidence: 0.85,
            source: "DuckDuckGo instant answer".to_string(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Wikipedia summaries

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    query: SearchQuery,
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

pub struct WikipediaProvider {
    client: Client,
    rest_url: String,
    api_url: String,
}

impl WikipediaProvider {
    pub fn new() -> Result<Self> {
        Self::with_base_urls(WIKIPEDIA_REST_URL, WIKIPEDIA_API_URL)
    }

    /// Point at different endpoints; tests use this against a local server.
    pub fn with_base_urls(
        rest_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(WIKIPEDIA_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            rest_url: rest_url.into(),
            api_url: api_url.into(),
        })
    }

    /// Strip interrogative filler so "who is the current prime minister of
    /// india" becomes "prime minister of india".
    fn extract_topic(query: &str) -> String {
        query
            .to_lowercase()
            .replace('?', "")
            .split_whitespace()
            .filter(|w| !matches!(*w, "who" | "what" | "is" | "the" | "current"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Title-cased, underscore-joined page path for the summary endpoint.
    fn title_path(term: &str) -> String {
        term.split_whitespace()
            .map(title_case)
            .collect::<Vec<_>>()
            .join("_")
    }

    async fn summary(&self, title_path: &str) -> Result<Option<ProviderAnswer>> {
        let url = format!("{}/page/summary/{}", self.rest_url, title_path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("summary request failed")?;

        match response.status() {
            status if status.is_success() => {
                let payload: SummaryPayload = response
                    .json()
                    .await
                    .context("malformed summary payload")?;
                if payload.extract.trim().is_empty() {
                    return Ok(None);
                }
                Ok(Some(ProviderAnswer {
                    text: payload.extract,
                    confidence: 0.90,
                    source: format!("Wikipedia: {}", payload.title),
                }))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => anyhow::bail!("summary returned {status}"),
        }
    }

    async fn search_top_title(&self, term: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", term),
                ("format", "json"),
                ("srlimit", "1"),
            ])
            .send()
            .await
            .context("search request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("search returned {}", response.status());
        }

        let payload: SearchPayload = response.json().await.context("malformed search payload")?;
        Ok(payload.query.search.into_iter().next().map(|hit| hit.title))
    }
}

#[async_trait]
impl AnswerProvider for WikipediaProvider {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    fn budget(&self) -> Duration {
        WIKIPEDIA_TIMEOUT * WIKIPEDIA_MAX_CALLS
    }

    async fn fetch(&self, query: &str) -> Result<Option<ProviderAnswer>> {
        let term = Self::extract_topic(query);
        if term.is_empty() {
            return Ok(None);
        }

        if let Some(answer) = self.summary(&Self::title_path(&term)).await? {
            return Ok(Some(answer));
        }

        // Direct title miss: one retry through the search endpoint.
        debug!(term = %term, "direct summary miss, retrying via search");
        match self.search_top_title(&term).await? {
            Some(title) => self.summary(&title.replace(' ', "_")).await,
            None => Ok(None),
        }
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
