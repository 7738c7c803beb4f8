use async_trait::async_trait;
use serde::Deserialize;

use crate::error::HarvestError;

/// One raw text-search result, before normalization
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    /// Opaque identifier of the place at the source.
    ///
    /// The service always sends one in practice, but a candidate without
    /// it cannot produce a canonical link and is skipped.
    #[serde(default)]
    pub place_id: Option<String>,

    /// Display name as returned by the search listing
    #[serde(default)]
    pub name: Option<String>,
}

/// Detail payload for a single candidate.
///
/// Every field is optional; a failed detail fetch degrades to the default
/// all-empty payload instead of dropping the candidate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceDetail {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub formatted_address: Option<String>,

    #[serde(default)]
    pub formatted_phone_number: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    #[serde(default)]
    pub rating: Option<f64>,
}

/// One page of search results plus the continuation token, if any
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Candidates in the order the source returned them
    pub candidates: Vec<Candidate>,

    /// Token for the next page; absent when the source is exhausted
    pub next_page_token: Option<String>,
}

/// Backend that performs the places searches.
///
/// The fetch loop only talks to this trait: production wires in the HTTP
/// client from [`google`](super::google), tests script a stub source.
#[async_trait]
pub trait PlaceSource: Send + Sync {
    /// Issue the initial search for a query
    async fn search(&self, query: &str) -> Result<SearchPage, HarvestError>;

    /// Fetch a further page of results using a continuation token
    async fn search_page(
        &self,
        query: &str,
        page_token: &str,
    ) -> Result<SearchPage, HarvestError>;

    /// Fetch the detail payload for one place
    async fn detail(&self, place_id: &str) -> Result<PlaceDetail, HarvestError>;
}
