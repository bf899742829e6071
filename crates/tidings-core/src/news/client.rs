//! Headlines API client
//!
//! `GET {base}/top-headlines?q={query}&country={code}&apiKey={key}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::country::Country;
use super::models::{ApiErrorBody, NewsResponse};
use crate::config::Config;
use crate::error::FetchError;

/// Anything that can produce top headlines for a country
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn top_headlines(&self, country: &Country) -> Result<NewsResponse, FetchError>;
}

/// reqwest-backed client for the headlines API
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    http: Client,
    base_url: String,
    api_key: String,
    query: String,
}

impl NewsApiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tidings/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            query: "tesla".to_string(),
        })
    }

    /// Build a client from configuration; the API key is required
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let api_key = config
            .news_api_key
            .clone()
            .ok_or(FetchError::MissingApiKey)?;
        Ok(Self::new(&config.news_api_url, api_key, config.request_timeout())?
            .with_query(&config.news_query))
    }

    /// Change the fixed search term
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    /// The request URL for a country
    pub fn headlines_url(&self, country: &Country) -> Result<Url, FetchError> {
        let base = format!("{}/top-headlines", self.base_url);
        Url::parse_with_params(
            &base,
            &[
                ("q", self.query.as_str()),
                ("country", country.code),
                ("apiKey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base, e)))
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn top_headlines(&self, country: &Country) -> Result<NewsResponse, FetchError> {
        let url = self.headlines_url(country)?;
        debug!("Fetching headlines for {}", country.code);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let detail: Option<ApiErrorBody> = serde_json::from_slice(&body).ok();
            let (code, message) = match detail {
                Some(d) => (
                    d.code.unwrap_or_else(|| status.as_u16().to_string()),
                    d.message.unwrap_or_else(|| status.to_string()),
                ),
                None => (status.as_u16().to_string(), status.to_string()),
            };
            return Err(FetchError::Api { code, message });
        }

        serde_json::from_slice(&body).map_err(|e| {
            debug!("Received JSON: {}", String::from_utf8_lossy(&body));
            FetchError::Decode(e.to_string())
        })
    }
}
