//! Read-only client for the catalog endpoints.
//!
//! One GET per call, default headers, no retries and no caching.

use std::time::Duration;

pub use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::{AnimeRecord, CatalogPage};
use crate::config::ApiConfig;

/// The three logical endpoints the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Schedules,
    TopAiring,
    Popular,
}

impl Endpoint {
    pub fn path_and_query(self) -> &'static str {
        match self {
            Self::Schedules => "/v4/schedules",
            Self::TopAiring => "/v4/top/anime?filter=airing",
            Self::Popular => "/v4/top/anime",
        }
    }
}

/// Coarse failure class, for callers that only care whether the transport or
/// the payload was at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: StatusCode },
    #[error("malformed response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// A non-success status counts as a network failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } | Self::Status { .. } => ErrorKind::Network,
            Self::Parse { .. } => ErrorKind::Parse,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self::with_http(builder.build()?, config.base_url.clone()))
    }

    fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path_and_query())
    }

    pub async fn fetch_schedules(&self) -> Result<Vec<AnimeRecord>, CatalogError> {
        self.fetch_list(Endpoint::Schedules).await
    }

    pub async fn fetch_top_airing(&self) -> Result<Vec<AnimeRecord>, CatalogError> {
        self.fetch_list(Endpoint::TopAiring).await
    }

    pub async fn fetch_popular(&self) -> Result<Vec<AnimeRecord>, CatalogError> {
        self.fetch_list(Endpoint::Popular).await
    }

    /// Connectivity check against the popular endpoint. Only the status is
    /// inspected; the body is never read.
    pub async fn probe(&self) -> Result<(), CatalogError> {
        let url = self.url_for(Endpoint::Popular);
        self.get(&url).await.map(drop)
    }

    pub async fn fetch_list(&self, endpoint: Endpoint) -> Result<Vec<AnimeRecord>, CatalogError> {
        let url = self.url_for(endpoint);
        let response = self.get(&url).await?;

        let body = response.bytes().await.map_err(|source| {
            warn!("catalog: reading body from {} failed: {}", url, source);
            CatalogError::Network {
                url: url.clone(),
                source,
            }
        })?;

        let page: CatalogPage = serde_json::from_slice(&body).map_err(|source| {
            warn!("catalog: {} returned malformed JSON: {}", url, source);
            CatalogError::Parse {
                url: url.clone(),
                source,
            }
        })?;

        let records = page.into_records();
        debug!("catalog: {:?} -> {} records", endpoint, records.len());
        Ok(records)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, CatalogError> {
        debug!("catalog: GET {}", url);
        let response = self.http.get(url).send().await.map_err(|source| {
            warn!("catalog: GET {} failed: {}", url, source);
            CatalogError::Network {
                url: url.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("catalog: GET {} returned {}", url, status);
            return Err(CatalogError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }
}
