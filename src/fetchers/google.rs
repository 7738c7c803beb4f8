use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::source::{Candidate, PlaceDetail, PlaceSource, SearchPage};
use crate::config::FetchConfig;
use crate::error::HarvestError;

/// Detail fields requested from the service; exactly the set the
/// normalizer maps into a record
const DETAIL_FIELDS: &str = "name,formatted_address,formatted_phone_number,website,rating";

/// HTTP client for the Google Maps Places text-search web service
pub struct GoogleMapsClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

/// Envelope of a text-search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,

    #[serde(default)]
    error_message: Option<String>,

    #[serde(default)]
    results: Vec<Candidate>,

    #[serde(default)]
    next_page_token: Option<String>,
}

/// Envelope of a place-details response
#[derive(Debug, Deserialize)]
struct DetailResponse {
    status: String,

    #[serde(default)]
    error_message: Option<String>,

    #[serde(default)]
    result: Option<PlaceDetail>,
}

impl GoogleMapsClient {
    /// Create a client for the given configuration.
    ///
    /// Fails synchronously on a missing API key or an unparseable base
    /// URL, before any request is made.
    pub fn new(config: &FetchConfig) -> Result<Self, HarvestError> {
        if config.api_key.trim().is_empty() {
            return Err(HarvestError::MissingApiKey);
        }
        let base_url = Url::parse(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }

    async fn get_search(&self, params: &[(&str, &str)]) -> Result<SearchPage, HarvestError> {
        let url = self.endpoint("/maps/api/place/textsearch/json");
        let response: SearchResponse = self
            .http
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        check_status(&response.status, response.error_message)?;
        Ok(SearchPage {
            candidates: response.results,
            next_page_token: response.next_page_token,
        })
    }
}

#[async_trait]
impl PlaceSource for GoogleMapsClient {
    async fn search(&self, query: &str) -> Result<SearchPage, HarvestError> {
        ::log::debug!("searching places for query: {}", query);
        self.get_search(&[("query", query), ("key", &self.api_key)])
            .await
    }

    async fn search_page(
        &self,
        query: &str,
        page_token: &str,
    ) -> Result<SearchPage, HarvestError> {
        ::log::debug!("fetching continuation page for query: {}", query);
        self.get_search(&[
            ("query", query),
            ("pagetoken", page_token),
            ("key", &self.api_key),
        ])
        .await
    }

    async fn detail(&self, place_id: &str) -> Result<PlaceDetail, HarvestError> {
        let url = self.endpoint("/maps/api/place/details/json");
        let response: DetailResponse = self
            .http
            .get(url)
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("key", &self.api_key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        check_status(&response.status, response.error_message)?;
        // A place that vanished between search and detail behaves like an
        // empty payload
        Ok(response.result.unwrap_or_default())
    }
}

/// `OK` and `ZERO_RESULTS` are the service's success statuses; anything
/// else is an API error carrying the service's message.
fn check_status(status: &str, message: Option<String>) -> Result<(), HarvestError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        _ => Err(HarvestError::Api {
            status: status.to_string(),
            message: message.unwrap_or_default(),
        }),
    }
}
