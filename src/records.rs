use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fetchers::source::PlaceDetail;

/// Column headers of the exported dataset, in export order.
///
/// Kept bit-exact to the sheets this tool has always produced
/// (misspellings included) so merges against previously exported files
/// line up column for column.
pub const COLUMNS: [&str; 17] = [
    "Lead ID",
    "Name",
    "Phone Number",
    "Phone Number 2",
    "Email",
    "Insitute Name",
    "Address",
    "Subscription Plan",
    "Payment Status",
    "Source Of Enqiry",
    "Status",
    "Subscription Taken",
    "Notes",
    "Google map Link",
    "Website",
    "Website Review",
    "Rating",
];

/// Column whose value identifies a row across exports; it doubles as the
/// dedup key.
pub const LINK_COLUMN: &str = "Google map Link";

/// Sentinel rendered when the provider reports no rating
pub const NO_RATING: &str = "N/A";

/// Builds the canonical maps link for a place identifier.
///
/// Every record derived from the same place yields the same link, so the
/// template must stay bit-exact.
pub fn maps_link(place_id: &str) -> String {
    format!("https://www.google.com/maps/place/?q=place_id:{place_id}")
}

/// A fully normalized lead destined for the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Generated identifier, independent of the source
    pub lead_id: String,

    /// Business name
    pub name: String,

    /// Formatted street address
    pub address: String,

    /// Formatted phone number
    pub phone: String,

    /// Website URL
    pub website: String,

    /// Rating in display form ("N/A" when the provider reports none)
    pub rating: String,

    /// Canonical maps link derived from the place identifier
    pub maps_link: String,
}

impl Record {
    /// Normalizes a detail payload into a record.
    ///
    /// Missing optional fields become empty strings rather than errors;
    /// only the lead identifier differs between two calls for the same
    /// input.
    pub fn from_source(place_id: &str, detail: &PlaceDetail) -> Self {
        Self {
            lead_id: Uuid::new_v4().to_string(),
            name: detail.name.clone().unwrap_or_default(),
            address: detail.formatted_address.clone().unwrap_or_default(),
            phone: detail.formatted_phone_number.clone().unwrap_or_default(),
            website: detail.website.clone().unwrap_or_default(),
            rating: detail
                .rating
                .map(|rating| rating.to_string())
                .unwrap_or_else(|| NO_RATING.to_string()),
            maps_link: maps_link(place_id),
        }
    }

    /// Value exported under the given column header.
    ///
    /// Columns the fetcher does not fill stay blank for downstream manual
    /// entry, as do custom columns found only in a loaded file.
    pub fn value_for(&self, column: &str) -> &str {
        match column {
            "Lead ID" => &self.lead_id,
            "Name" | "Insitute Name" => &self.name,
            "Phone Number" => &self.phone,
            "Address" => &self.address,
            "Source Of Enqiry" => "Google Maps",
            "Google map Link" => &self.maps_link,
            "Website" => &self.website,
            "Rating" => &self.rating,
            _ => "",
        }
    }

    /// Row representation under the given column order
    pub fn to_row(&self, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|column| self.value_for(column).to_string())
            .collect()
    }
}
