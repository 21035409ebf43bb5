use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ShelfError;

pub const DEFAULT_ENDPOINT: &str = "https://stephen-king-api.onrender.com/api/books";

/// Wire-format record as served by the catalog endpoint. Field names and
/// casing are part of the wire contract. Everything is loose here; the
/// ingestion step in `catalog` decides what survives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBook {
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Year")]
    pub year: Option<Value>,
    #[serde(rename = "Publisher")]
    pub publisher: Option<String>,
    #[serde(rename = "ISBN")]
    pub isbn: Option<String>,
    #[serde(rename = "Pages")]
    pub pages: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct BooksEnvelope {
    data: Vec<RawBook>,
}

pub trait CatalogClient: Send + Sync {
    fn fetch_books(&self) -> Result<Vec<RawBook>, ShelfError>;
}

#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
    endpoint: String,
}

impl CatalogHttpClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ShelfError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kingshelf/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ShelfError::CatalogHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| ShelfError::CatalogHttp(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ShelfError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "catalog request failed".to_string());
        Err(ShelfError::CatalogStatus { status, message })
    }
}

impl CatalogClient for CatalogHttpClient {
    /// One GET for the full record set. No automatic retry: recovery from a
    /// failed load is a subsequent explicit load request.
    fn fetch_books(&self) -> Result<Vec<RawBook>, ShelfError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .map_err(|err| ShelfError::CatalogHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let envelope: BooksEnvelope = response
            .json()
            .map_err(|err| ShelfError::CatalogHttp(err.to_string()))?;
        Ok(envelope.data)
    }
}
