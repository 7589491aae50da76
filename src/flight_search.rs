// Flight search client for the SerpApi Google Flights engine

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SerpApiConfig;
use crate::offers::{select_cheapest, FlightOffer};
use crate::trip::{TripRequest, DATE_FORMAT};

// Every variant means the provider could not be used for this request
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}s")]
    Timeout(u64),

    #[error("Search API error: {status_code} - {message}")]
    Status { status_code: u16, message: String },

    #[error("Malformed search response: {0}")]
    Decode(String),

    #[error("Client error: {0}")]
    Client(String),
}

#[async_trait]
pub trait FlightSearch: Send + Sync {
    /// Issue one search and return the provider's decoded response as-is.
    async fn search(&self, request: &TripRequest) -> Result<Value, SearchError>;
}

// Query parameters of one search request
#[derive(Debug, Serialize)]
pub struct FlightSearchParams<'a> {
    pub engine: &'a str,
    pub departure_id: &'a str,
    pub arrival_id: &'a str,
    pub outbound_date: String,
    pub return_date: String,
    pub currency: &'a str,
    pub hl: &'a str,
    pub api_key: &'a str,
}

pub struct SerpApiClient {
    http: Client,
    base_url: String,
    engine: String,
    locale: String,
    api_key: String,
    timeout_secs: u64,
}

impl SerpApiClient {
    pub fn from_config(config: &SerpApiConfig) -> Result<Self, SearchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            engine: config.engine.clone(),
            locale: config.locale.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn params<'a>(&'a self, request: &'a TripRequest) -> FlightSearchParams<'a> {
        FlightSearchParams {
            engine: &self.engine,
            departure_id: request.origin(),
            arrival_id: request.destination(),
            outbound_date: request.outbound_date().format(DATE_FORMAT).to_string(),
            return_date: request.return_date().format(DATE_FORMAT).to_string(),
            currency: request.currency(),
            hl: &self.locale,
            api_key: &self.api_key,
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> SearchError {
        if err.is_timeout() {
            SearchError::Timeout(self.timeout_secs)
        } else {
            SearchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl FlightSearch for SerpApiClient {
    async fn search(&self, request: &TripRequest) -> Result<Value, SearchError> {
        let url = format!("{}/search.json", self.base_url);
        debug!(
            origin = request.origin(),
            destination = request.destination(),
            engine = %self.engine,
            "Searching flights"
        );

        let response = self
            .http
            .get(&url)
            .query(&self.params(request))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlightStatus {
    Found,
    NoData,
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct FlightLookup {
    pub offers: Vec<FlightOffer>,
    pub status: FlightStatus,
}

/// Search and rank, degrading every provider failure to an empty result.
pub async fn fetch_offers(search: &dyn FlightSearch, request: &TripRequest) -> FlightLookup {
    let raw = match search.search(request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Flight search unavailable");
            return FlightLookup {
                offers: Vec::new(),
                status: FlightStatus::Unavailable(e.to_string()),
            };
        }
    };

    if let Some(message) = raw.get("error").and_then(Value::as_str) {
        warn!(%message, "Flight search returned an error message");
    }

    let offers = select_cheapest(&raw);
    info!(count = offers.len(), "Ranked flight offers");

    let status = if offers.is_empty() {
        FlightStatus::NoData
    } else {
        FlightStatus::Found
    };

    FlightLookup { offers, status }
}
