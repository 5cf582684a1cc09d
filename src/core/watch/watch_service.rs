use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};

/// Public Légifrance portal prefix that JORF document ids are appended to.
const JORF_PORTAL_BASE: &str = "https://www.legifrance.gouv.fr/jorf/id";

/// Placeholder for the habilitation column, which is not derivable from the
/// search response.
const UNKNOWN_HABILITATION: &str = "Inconnue";

/// Errors that can be raised by the watch pipeline.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Légifrance authentication error: {0}")]
    Auth(String),
    #[error("Légifrance search error: {0}")]
    Search(String),
    #[error("Grist store error: {0}")]
    Store(String),
}

/// The active search request read from the requests table.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub row_id: u64,
    pub criterion: String,
}

/// One raw document returned by the search API, independent of any HTTP types.
#[derive(Debug, Clone)]
pub struct DocumentHit {
    pub id: String,
    pub title: String,
    pub date_publi: String,
}

/// One row destined for the results table. Fields that cannot be derived from
/// the search response are filled with fixed placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub criterion: String,
    pub title: String,
    pub publication_date: String,
    pub source_url: String,
    pub habilitation: String,
    pub region: String,
    pub validity_year: Option<u32>,
}

impl ResultRecord {
    /// Build the row for one search hit: publication timestamps are truncated
    /// to their date portion and the document id becomes a portal URL.
    pub fn from_document(document: &DocumentHit, criterion: &str) -> Self {
        Self {
            criterion: criterion.to_string(),
            title: document.title.clone(),
            publication_date: truncate_date(&document.date_publi),
            source_url: format!("{}/{}", JORF_PORTAL_BASE, document.id),
            habilitation: UNKNOWN_HABILITATION.to_string(),
            region: String::new(),
            validity_year: None,
        }
    }
}

/// Keep the first 10 characters of a publication date, dropping any time
/// component. Shorter strings pass through unchanged.
pub fn truncate_date(raw: &str) -> String {
    raw.chars().take(10).collect()
}

/// What a single pass of the pipeline did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No request row had its trigger set.
    Idle,
    /// A request was processed; counts cover the per-row insert attempts.
    Completed { inserted: usize, failed: usize },
    /// A request was found but the token or search step failed.
    Aborted,
}

/// Trait describing the minimal search API operations needed by the service.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn fetch_token(&self) -> Result<String, WatchError>;
    async fn search(&self, criterion: &str, token: &str) -> Result<Vec<DocumentHit>, WatchError>;
}

/// Storage layer abstraction over the request and result tables.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_pending_request(&self) -> Result<Option<SearchRequest>, WatchError>;
    async fn insert_result(&self, record: &ResultRecord) -> Result<(), WatchError>;
    async fn reset_trigger(&self, row_id: u64) -> Result<(), WatchError>;
}

/// Service that runs one pass of the watch pipeline: read the pending request,
/// search Légifrance, write the results back, clear the trigger.
///
/// The orchestration lives here so it can be tested without HTTP concerns.
pub struct WatchService<C: SearchClient, S: RecordStore> {
    search: C,
    store: S,
    insert_delay: Duration,
}

impl<C, S> WatchService<C, S>
where
    C: SearchClient,
    S: RecordStore,
{
    pub fn new(search: C, store: S, insert_delay: Duration) -> Self {
        Self {
            search,
            store,
            insert_delay,
        }
    }

    /// Run a single pass. Only a failure to read the requests table is
    /// propagated; everything after a request has been found is logged and
    /// folded into the returned outcome.
    pub async fn run_once(&self) -> Result<RunOutcome, WatchError> {
        let Some(request) = self.store.find_pending_request().await? else {
            return Ok(RunOutcome::Idle);
        };

        info!(
            row_id = request.row_id,
            criterion = %request.criterion,
            "Starting search for pending request"
        );

        let outcome = match self.execute(&request).await {
            Ok((inserted, failed)) => RunOutcome::Completed { inserted, failed },
            Err(err) => {
                error!("Search pipeline failed: {err}");
                RunOutcome::Aborted
            }
        };

        // The trigger must not stay stuck after a failed run, so the reset is
        // attempted on both paths. A failed reset is only logged.
        if let Err(err) = self.store.reset_trigger(request.row_id).await {
            warn!(
                "Failed to reset trigger for row {}: {err}",
                request.row_id
            );
        }

        Ok(outcome)
    }

    /// Token exchange, search call, and one insert attempt per document in
    /// response order. Insert failures skip the row and keep going.
    async fn execute(&self, request: &SearchRequest) -> Result<(usize, usize), WatchError> {
        let token = self.search.fetch_token().await?;
        let documents = self.search.search(&request.criterion, &token).await?;

        info!("Search returned {} document(s)", documents.len());

        let mut inserted = 0;
        let mut failed = 0;
        for document in &documents {
            let record = ResultRecord::from_document(document, &request.criterion);
            match self.store.insert_result(&record).await {
                Ok(()) => {
                    info!("Inserted result: {}", record.title);
                    inserted += 1;
                }
                Err(err) => {
                    warn!("Failed to insert result '{}': {err}", record.title);
                    failed += 1;
                }
            }
            // Fixed pacing between insert calls so the store is not hammered.
            if !self.insert_delay.is_zero() {
                tokio::time::sleep(self.insert_delay).await;
            }
        }

        Ok((inserted, failed))
    }
}

// ============================================================================
// TESTS
// ============================================================================
// Core logic should be thoroughly tested since it contains the pipeline rules.
