pub mod google;
pub mod source;


use std::time::Duration;

use tokio::sync::mpsc;

use crate::dedupe::SeenLinks;
use crate::error::HarvestError;
use crate::records::Record;
use source::{PlaceDetail, PlaceSource, SearchPage};

/// Progress notifications published by the fetch worker
#[derive(Debug, Clone)]
pub enum FetchEvent {
    /// A new record passed deduplication; `fetched` counts this
    /// invocation's batch so far
    Admitted { record: Record, fetched: usize },

    /// A non-fatal problem the operator should see
    Warning(String),
}

/// What a single fetch invocation produced
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Newly admitted records, in admission order
    pub records: Vec<Record>,

    /// Continuation token for a later invocation, when the source still
    /// has pages
    pub next_token: Option<String>,

    /// True when the source reported no further pages
    pub exhausted: bool,
}

/// Drives paged retrieval for `query` until `target_count` new records
/// are accumulated or the source runs out of pages.
///
/// Candidates are processed strictly in source order: detail fetch,
/// normalization, then deduplication against `seen`. Admitted records are
/// published on `events` as they arrive. With a `resume_token` the first
/// request picks up where a previous invocation stopped; the seen-set
/// and token live with the caller, so "continue fetching" is simply a
/// repeat invocation.
///
/// A failed initial page request is fatal and propagates. A failed
/// request for a later page is a soft stop: what was accumulated is
/// returned, the token is dropped and `exhausted` stays false, since the
/// provider's state is unknown at that point.
pub async fn fetch(
    source: &dyn PlaceSource,
    query: &str,
    target_count: usize,
    resume_token: Option<&str>,
    seen: &mut SeenLinks,
    page_delay: Duration,
    events: Option<&mpsc::Sender<FetchEvent>>,
) -> Result<FetchOutcome, HarvestError> {
    if query.trim().is_empty() {
        return Err(HarvestError::EmptyQuery);
    }

    let mut page = match resume_token {
        Some(token) => source.search_page(query, token).await?,
        None => source.search(query).await?,
    };

    let mut outcome = FetchOutcome::default();
    loop {
        scan_page(source, &page, target_count, seen, &mut outcome, events).await;
        outcome.next_token = page.next_page_token.clone();

        if outcome.records.len() >= target_count {
            break;
        }
        let Some(token) = outcome.next_token.clone() else {
            break;
        };

        // Continuation tokens take a moment to activate on the provider
        // side
        tokio::time::sleep(page_delay).await;

        page = match source.search_page(query, &token).await {
            Ok(next) => next,
            Err(e) => {
                let warning = format!(
                    "pagination failed, stopping with {} records: {}",
                    outcome.records.len(),
                    e
                );
                ::log::warn!("{}", warning);
                publish(events, FetchEvent::Warning(warning)).await;
                // The provider's state is unknown: no resuming from the
                // stale token, and no claim of exhaustion either
                outcome.next_token = None;
                return Ok(outcome);
            }
        };
    }

    outcome.exhausted = outcome.next_token.is_none();
    ::log::info!(
        "fetch finished with {} new records (exhausted: {})",
        outcome.records.len(),
        outcome.exhausted
    );
    Ok(outcome)
}

/// Scans one page of candidates in source order, stopping early once the
/// batch reaches the target count.
async fn scan_page(
    source: &dyn PlaceSource,
    page: &SearchPage,
    target_count: usize,
    seen: &mut SeenLinks,
    outcome: &mut FetchOutcome,
    events: Option<&mpsc::Sender<FetchEvent>>,
) {
    for candidate in &page.candidates {
        if outcome.records.len() >= target_count {
            break;
        }
        let Some(place_id) = candidate.place_id.as_deref() else {
            ::log::warn!("search result without a place_id, skipping");
            continue;
        };

        // A failed detail fetch is non-fatal: the candidate keeps its
        // slot with all-empty detail fields
        let detail = match source.detail(place_id).await {
            Ok(detail) => detail,
            Err(e) => {
                ::log::warn!("failed to fetch details for {}: {}", place_id, e);
                PlaceDetail::default()
            }
        };

        let record = Record::from_source(place_id, &detail);
        if !seen.admit(&record.maps_link) {
            ::log::debug!("skipping already harvested link: {}", record.maps_link);
            continue;
        }

        outcome.records.push(record.clone());
        let fetched = outcome.records.len();
        publish(events, FetchEvent::Admitted { record, fetched }).await;
    }
}

/// Publishes an event when a sink is attached; a dropped receiver only
/// means nobody is watching anymore.
async fn publish(events: Option<&mpsc::Sender<FetchEvent>>, event: FetchEvent) {
    if let Some(tx) = events {
        if tx.send(event).await.is_err() {
            ::log::debug!("event receiver dropped, continuing without progress updates");
        }
    }
}
