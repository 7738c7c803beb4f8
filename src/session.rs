use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::dedupe::SeenLinks;
use crate::error::HarvestError;
use crate::fetchers::source::PlaceSource;
use crate::fetchers::{self, FetchEvent};
use crate::merge;
use crate::records::Record;

/// Summary of one fetch invocation, for the operator surface
#[derive(Debug, Clone, Copy)]
pub struct FetchSummary {
    /// Records admitted by this invocation
    pub new_records: usize,

    /// Records accumulated across the whole session
    pub total_records: usize,

    /// Whether a continuation token is stored to continue from
    pub more_available: bool,

    /// Whether the source reported the end of its results
    pub exhausted: bool,
}

/// One harvesting session.
///
/// Owns the seen-set, the accumulated record batch, the continuation
/// token and the loaded dataset path, and hands them to the fetch loop
/// and the merge writer. Exactly one fetch can run at a time: both
/// `start` and `continue_fetch` borrow the session mutably for the whole
/// invocation.
pub struct Session {
    source: Arc<dyn PlaceSource>,
    page_delay: Duration,
    seen: SeenLinks,
    records: Vec<Record>,
    next_token: Option<String>,
    query: Option<String>,
    target_count: usize,
    input_path: Option<PathBuf>,
    events: Option<mpsc::Sender<FetchEvent>>,
}

impl Session {
    /// Create a session over the given source
    pub fn new(source: Arc<dyn PlaceSource>) -> Self {
        Self {
            source,
            page_delay: Duration::from_secs(2),
            seen: SeenLinks::new(),
            records: Vec::new(),
            next_token: None,
            query: None,
            target_count: 0,
            input_path: None,
            events: None,
        }
    }

    /// Override the delay between page requests
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Attach a progress sink; the fetch worker publishes one event per
    /// admission plus any warnings.
    pub fn set_event_sink(&mut self, sink: mpsc::Sender<FetchEvent>) {
        self.events = Some(sink);
    }

    /// Detach the progress sink so a consumer loop on the receiving end
    /// terminates.
    pub fn clear_event_sink(&mut self) {
        self.events = None;
    }

    /// Seeds the seen-set from a previously exported dataset and records
    /// the path as the merge target. Returns how many links were seeded.
    pub fn load_existing_file(&mut self, path: &Path) -> usize {
        let seeded = self.seen.seed(merge::seed_links(path));
        self.input_path = Some(path.to_path_buf());
        ::log::info!("loaded {} existing links from {}", seeded, path.display());
        seeded
    }

    /// Starts a fresh fetch run for `query`.
    ///
    /// Rejects an empty query synchronously, before any request. The
    /// per-run batch and token are reset; links seeded from a loaded file
    /// and links seen by earlier runs stay suppressed.
    pub async fn start(
        &mut self,
        query: &str,
        target_count: usize,
    ) -> Result<FetchSummary, HarvestError> {
        if query.trim().is_empty() {
            return Err(HarvestError::EmptyQuery);
        }

        self.records.clear();
        self.next_token = None;
        self.query = Some(query.to_string());
        self.target_count = target_count;
        self.run_fetch(None).await
    }

    /// Continues the previous run from its continuation token,
    /// accumulating another batch of up to the run's target count.
    pub async fn continue_fetch(&mut self) -> Result<FetchSummary, HarvestError> {
        let Some(token) = self.next_token.clone() else {
            return Err(HarvestError::NoResumeToken);
        };
        self.run_fetch(Some(token)).await
    }

    async fn run_fetch(
        &mut self,
        resume_token: Option<String>,
    ) -> Result<FetchSummary, HarvestError> {
        let query = self.query.clone().ok_or(HarvestError::EmptyQuery)?;

        let result = fetchers::fetch(
            self.source.as_ref(),
            &query,
            self.target_count,
            resume_token.as_deref(),
            &mut self.seen,
            self.page_delay,
            self.events.as_ref(),
        )
        .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                // A failed invocation cannot be resumed blindly; the next
                // run starts from scratch
                self.next_token = None;
                return Err(e);
            }
        };

        let new_records = outcome.records.len();
        self.records.extend(outcome.records);
        self.next_token = outcome.next_token;

        Ok(FetchSummary {
            new_records,
            total_records: self.records.len(),
            more_available: self.next_token.is_some(),
            exhausted: outcome.exhausted,
        })
    }

    /// Appends the session's accumulated records to the loaded dataset
    /// file. Returns the written path, or `None` when no file was loaded.
    pub fn merge_to_file(&self) -> Result<Option<&Path>, HarvestError> {
        let Some(path) = self.input_path.as_deref() else {
            return Ok(None);
        };
        merge::merge(path, &self.records)?;
        Ok(Some(path))
    }

    /// Records accumulated by this session, in admission order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of links in the seen-set
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Continuation token stored for `continue_fetch`, if any
    pub fn resume_token(&self) -> Option<&str> {
        self.next_token.as_deref()
    }

    /// Dataset path loaded as merge target, if any
    pub fn input_path(&self) -> Option<&Path> {
        self.input_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::source::{Candidate, PlaceDetail, SearchPage};
    use crate::records::maps_link;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::Mutex;

    /// Serves scripted pages in order; details are always empty payloads.
    struct ScriptedSource {
        pages: Mutex<VecDeque<SearchPage>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<SearchPage>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages.into()),
            })
        }

        fn next_page(&self) -> SearchPage {
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("no more scripted pages")
        }
    }

    #[async_trait]
    impl PlaceSource for ScriptedSource {
        async fn search(&self, _query: &str) -> Result<SearchPage, HarvestError> {
            Ok(self.next_page())
        }

        async fn search_page(
            &self,
            _query: &str,
            _page_token: &str,
        ) -> Result<SearchPage, HarvestError> {
            Ok(self.next_page())
        }

        async fn detail(&self, _place_id: &str) -> Result<PlaceDetail, HarvestError> {
            Ok(PlaceDetail::default())
        }
    }

    fn page(ids: &[&str], token: Option<&str>) -> SearchPage {
        SearchPage {
            candidates: ids
                .iter()
                .map(|id| Candidate {
                    place_id: Some(id.to_string()),
                    name: None,
                })
                .collect(),
            next_page_token: token.map(|t| t.to_string()),
        }
    }

    #[tokio::test]
    async fn test_start_rejects_empty_query() {
        let source = ScriptedSource::new(vec![]);
        let mut session = Session::new(source);

        assert!(matches!(
            session.start("   ", 5).await,
            Err(HarvestError::EmptyQuery)
        ));
        assert!(session.records().is_empty());
    }

    #[tokio::test]
    async fn test_continue_without_token_is_rejected() {
        let source = ScriptedSource::new(vec![]);
        let mut session = Session::new(source);

        assert!(matches!(
            session.continue_fetch().await,
            Err(HarvestError::NoResumeToken)
        ));
    }

    #[tokio::test]
    async fn test_records_accumulate_across_continues() {
        let source = ScriptedSource::new(vec![
            page(&["a", "b"], Some("t1")),
            page(&["c"], None),
        ]);
        let mut session = Session::new(source);

        let first = session.start("tutors", 2).await.unwrap();
        assert_eq!(first.new_records, 2);
        assert_eq!(first.total_records, 2);
        assert!(first.more_available);
        assert!(!first.exhausted);
        assert_eq!(session.resume_token(), Some("t1"));

        let second = session.continue_fetch().await.unwrap();
        assert_eq!(second.new_records, 1);
        assert_eq!(second.total_records, 3);
        assert!(!second.more_available);
        assert!(second.exhausted);
        assert_eq!(session.records().len(), 3);
        assert_eq!(session.records()[2].maps_link, maps_link("c"));
    }

    #[tokio::test]
    async fn test_loaded_file_seeds_dedup_and_merge_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        fs::write(
            &path,
            format!("Name,Google map Link\nAlpha,{}\n", maps_link("a")),
        )
        .unwrap();

        let source = ScriptedSource::new(vec![page(&["a", "b"], None)]);
        let mut session = Session::new(source);

        let seeded = session.load_existing_file(&path);
        assert_eq!(seeded, 1);
        assert_eq!(session.input_path(), Some(path.as_path()));

        let summary = session.start("tutors", 10).await.unwrap();
        assert_eq!(summary.new_records, 1);
        assert_eq!(session.records()[0].maps_link, maps_link("b"));

        let written = session.merge_to_file().unwrap();
        assert_eq!(written, Some(path.as_path()));
        let dataset = merge::load(&path).unwrap();
        assert_eq!(dataset.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_merge_without_loaded_file_is_a_noop() {
        let source = ScriptedSource::new(vec![page(&["a"], None)]);
        let mut session = Session::new(source);
        session.start("tutors", 1).await.unwrap();

        assert_eq!(session.merge_to_file().unwrap(), None);
    }

    #[tokio::test]
    async fn test_start_resets_the_previous_batch() {
        let source = ScriptedSource::new(vec![
            page(&["a"], None),
            page(&["b"], None),
        ]);
        let mut session = Session::new(source);

        session.start("tutors", 5).await.unwrap();
        let second = session.start("tutors", 5).await.unwrap();

        // The batch restarts, the seen-set does not
        assert_eq!(second.total_records, 1);
        assert_eq!(session.records()[0].maps_link, maps_link("b"));
        assert_eq!(session.seen_count(), 2);
    }
}
