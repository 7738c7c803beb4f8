use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Configuration for the places fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// API key passed through to the places service
    pub api_key: String,

    /// Base URL of the places web service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Seconds to wait before requesting a further page; the provider's
    /// continuation tokens take a moment to become active
    #[serde(default = "default_page_delay_secs")]
    pub page_delay_secs: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl FetchConfig {
    /// Create a configuration with default service settings
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: default_base_url(),
            page_delay_secs: default_page_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

/// Default base URL of the places web service
fn default_base_url() -> String {
    "https://maps.googleapis.com".to_string()
}

/// Default inter-page delay in seconds
fn default_page_delay_secs() -> u64 {
    2
}

/// Default per-request timeout in seconds
fn default_request_timeout_secs() -> u64 {
    10
}
