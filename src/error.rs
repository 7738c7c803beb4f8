use thiserror::Error;

/// Errors surfaced by the fetch loop, the session and the merge writer.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The caller submitted an empty search query
    #[error("search query must not be empty")]
    EmptyQuery,

    /// No API key was supplied for the places client
    #[error("missing Google Maps API key")]
    MissingApiKey,

    /// The configured service base URL does not parse
    #[error("invalid places base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    /// Continue was requested without a stored continuation token
    #[error("no continuation token to resume from")]
    NoResumeToken,

    /// Transport-level failure talking to the places service
    #[error("places request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The places service answered with a non-success status
    #[error("places API status {status}: {message}")]
    Api { status: String, message: String },

    /// Filesystem failure while reading or writing a dataset
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed delimited-text data
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Failure reading a spreadsheet
    #[error(transparent)]
    Spreadsheet(#[from] calamine::Error),

    /// Failure writing a spreadsheet
    #[error(transparent)]
    SpreadsheetWrite(#[from] rust_xlsxwriter::XlsxError),
}
