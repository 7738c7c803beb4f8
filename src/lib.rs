// Re-export modules
pub mod config;
pub mod dedupe;
pub mod error;
pub mod fetchers;
pub mod merge;
pub mod records;
pub mod session;

// Re-export commonly used types for convenience
pub use error::HarvestError;
pub use fetchers::{FetchEvent, FetchOutcome};
pub use records::Record;
pub use session::{FetchSummary, Session};
