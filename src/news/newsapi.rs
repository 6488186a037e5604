//! NewsAPI-compatible client (`GET {base}/everything`)

use super::article::NewsArticle;
use super::pacer::RequestPacer;
use super::provider::NewsProvider;
use crate::config::EsgConfig;
use crate::error::BackendError;
use crate::util::RetryPolicy;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Terms OR-ed into every company query
pub const DEFAULT_ESG_TERMS: &[&str] = &[
    "ESG",
    "sustainability",
    "environmental",
    "carbon",
    "emissions",
    "governance",
    "social responsibility",
    "climate",
    "renewable",
];

/// Terms OR-ed into sector-wide queries
pub const SECTOR_ESG_TERMS: &[&str] = &["ESG", "sustainability", "environmental impact"];

const SECTOR_PAGE_SIZE: u32 = 10;

/// What one `/everything` search asks for
#[derive(Debug, Clone, Copy)]
struct SearchParams<'a> {
    query: &'a str,
    from_date: &'a str,
    sort_by: &'a str,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<RawSource>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

#[derive(Debug)]
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
    timeout: Duration,
    pacer: RequestPacer,
    retry: RetryPolicy,
}

impl NewsApiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, BackendError> {
        let timeout = Duration::from_secs(10);
        Ok(Self {
            http: build_http(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            page_size: 20,
            timeout,
            pacer: RequestPacer::new(Duration::from_secs(1)),
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &EsgConfig) -> Result<Self, BackendError> {
        Ok(Self::new(config.news_base_url.clone(), config.news_api_key.clone())?
            .with_timeout(config.news_timeout())?
            .with_page_size(config.news_page_size)
            .with_min_interval(config.news_min_interval())
            .with_retry_policy(RetryPolicy::new(config.news_max_retries)))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, BackendError> {
        self.http = build_http(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.pacer = RequestPacer::new(interval);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetches articles, surfacing the final error instead of swallowing it.
    pub async fn try_fetch(
        &self,
        company_name: &str,
        days_back: u32,
    ) -> Result<Vec<NewsArticle>, BackendError> {
        let query = build_query(company_name, DEFAULT_ESG_TERMS);
        let from_date = from_date(days_back);
        self.search(
            "news_fetch",
            SearchParams {
                query: &query,
                from_date: &from_date,
                sort_by: "relevancy",
                page_size: self.page_size,
            },
        )
        .await
    }

    /// Newest sector-wide ESG coverage, at most ten articles
    pub async fn try_fetch_sector(
        &self,
        sector: &str,
        days_back: u32,
    ) -> Result<Vec<NewsArticle>, BackendError> {
        let query = build_query(sector, SECTOR_ESG_TERMS);
        let from_date = from_date(days_back);
        let mut articles = self
            .search(
                "sector_news_fetch",
                SearchParams {
                    query: &query,
                    from_date: &from_date,
                    sort_by: "publishedAt",
                    page_size: SECTOR_PAGE_SIZE,
                },
            )
            .await?;
        articles.truncate(SECTOR_PAGE_SIZE as usize);
        Ok(articles)
    }

    async fn search(
        &self,
        operation: &str,
        params: SearchParams<'_>,
    ) -> Result<Vec<NewsArticle>, BackendError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| BackendError::ConfigurationError {
                message: "NEWS_API_KEY not configured".to_string(),
            })?;

        self.retry
            .run(operation, |attempt| async move {
                debug!(query = params.query, attempt, "Requesting news");
                self.request_once(api_key, params).await
            })
            .await
    }

    async fn request_once(
        &self,
        api_key: &str,
        params: SearchParams<'_>,
    ) -> Result<Vec<NewsArticle>, BackendError> {
        self.pacer.wait().await;

        let page_size = params.page_size.to_string();
        let response = self
            .http
            .get(format!("{}/everything", self.base_url))
            .header("X-Api-Key", api_key)
            .query(&[
                ("q", params.query),
                ("from", params.from_date),
                ("sortBy", params.sort_by),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(BackendError::RateLimitError { retry_after });
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::AuthenticationError {
                message: "NewsAPI rejected the API key".to_string(),
            });
        }
        if !status.is_success() {
            return Err(BackendError::ApiError {
                message: format!("NewsAPI returned {}", status),
                status_code: Some(status.as_u16()),
            });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        parse_everything_response(&body)
    }

    fn transport_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::TimeoutError {
                seconds: self.timeout.as_secs(),
            }
        } else {
            BackendError::from(err)
        }
    }
}

fn build_http(timeout: Duration) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BackendError::ConfigurationError {
            message: format!("failed to build HTTP client: {}", e),
        })
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    async fn fetch(&self, company_name: &str, days_back: u32) -> Vec<NewsArticle> {
        if self.api_key.is_none() {
            warn!(company = company_name, "NEWS_API_KEY not configured, skipping news");
            return Vec::new();
        }

        match self.try_fetch(company_name, days_back).await {
            Ok(articles) => {
                info!(
                    company = company_name,
                    days_back,
                    count = articles.len(),
                    "Fetched news"
                );
                articles
            }
            Err(e) => {
                warn!(company = company_name, error = %e, "News fetch failed, continuing without news");
                Vec::new()
            }
        }
    }

    async fn fetch_sector(&self, sector: &str, days_back: u32) -> Vec<NewsArticle> {
        if self.api_key.is_none() {
            warn!(sector, "NEWS_API_KEY not configured, skipping sector news");
            return Vec::new();
        }

        match self.try_fetch_sector(sector, days_back).await {
            Ok(articles) => {
                info!(sector, days_back, count = articles.len(), "Fetched sector news");
                articles
            }
            Err(e) => {
                warn!(sector, error = %e, "Sector news fetch failed, continuing without news");
                Vec::new()
            }
        }
    }

    fn name(&self) -> &str {
        "newsapi"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// `"Acme" AND (ESG OR sustainability OR ...)`
pub fn build_query(subject: &str, terms: &[&str]) -> String {
    format!("\"{}\" AND ({})", subject.replace('"', ""), terms.join(" OR "))
}

fn from_date(days_back: u32) -> String {
    (Utc::now() - ChronoDuration::days(i64::from(days_back)))
        .format("%Y-%m-%d")
        .to_string()
}

/// Parses an `/everything` body. Articles lacking a title or a description
/// are dropped.
pub fn parse_everything_response(body: &str) -> Result<Vec<NewsArticle>, BackendError> {
    let parsed: EverythingResponse =
        serde_json::from_str(body).map_err(|e| BackendError::InvalidResponse {
            message: format!("malformed NewsAPI body: {}", e),
            raw_response: Some(body.chars().take(500).collect()),
        })?;

    if parsed.status != "ok" {
        return Err(BackendError::ApiError {
            message: parsed
                .message
                .unwrap_or_else(|| format!("NewsAPI status '{}'", parsed.status)),
            status_code: None,
        });
    }

    Ok(parsed
        .articles
        .into_iter()
        .filter_map(|raw| {
            let title = raw.title.filter(|t| !t.trim().is_empty())?;
            let description = raw.description.filter(|d| !d.trim().is_empty())?;
            Some(NewsArticle {
                title,
                description: Some(description),
                source: raw.source.and_then(|s| s.name),
                url: raw.url,
                published_at: raw.published_at,
            })
        })
        .collect())
}
