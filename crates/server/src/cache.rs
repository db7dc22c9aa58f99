//! Process-wide memory of the validated dataset.
//!
//! The dataset is read and validated at most once per invalidation cycle.
//! Loads are single-flight: callers that arrive while a load is running
//! wait for it and then share its result.

use std::sync::Arc;
use std::time::Instant;

use meigen_core::{
    check_data_integrity, validate_quotes, DataAccessError, IntegrityReport, Quote, QuoteSource,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    #[serde(rename = "isLoaded")]
    pub is_loaded: bool,
    pub count: usize,
}

pub struct DatasetCache<S> {
    source: Arc<S>,
    cell: RwLock<Option<Arc<Vec<Quote>>>>,
    load_gate: tokio::sync::Mutex<()>,
}

impl<S> DatasetCache<S>
where
    S: QuoteSource + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::from_shared(Arc::new(source))
    }

    #[must_use]
    pub fn from_shared(source: Arc<S>) -> Self {
        Self {
            source,
            cell: RwLock::new(None),
            load_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// The cached dataset, if any, without triggering a load.
    pub fn snapshot(&self) -> Option<Arc<Vec<Quote>>> {
        self.cell.read().clone()
    }

    pub async fn load(&self) -> Result<Arc<Vec<Quote>>, DataAccessError> {
        if let Some(quotes) = self.snapshot() {
            debug!(count = quotes.len(), "quote cache hit");
            return Ok(quotes);
        }

        let _gate = self.load_gate.lock().await;
        if let Some(quotes) = self.snapshot() {
            debug!(count = quotes.len(), "quote cache filled by concurrent load");
            return Ok(quotes);
        }

        let started = Instant::now();
        let quotes = match self.read_source().await.and_then(|raw| parse_dataset(&raw)) {
            Ok(quotes) => Arc::new(quotes),
            Err(err) => {
                warn!(code = err.code(), error = %err, source = %self.source.describe(), "quote load failed");
                return Err(err);
            }
        };
        *self.cell.write() = Some(Arc::clone(&quotes));
        info!(
            count = quotes.len(),
            source = %self.source.describe(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "quotes loaded"
        );
        Ok(quotes)
    }

    pub fn invalidate(&self) {
        let dropped = self.cell.write().take();
        info!(
            dropped = dropped.map(|q| q.len()).unwrap_or(0),
            "quote cache invalidated"
        );
    }

    pub fn status(&self) -> CacheStatus {
        let guard = self.cell.read();
        CacheStatus {
            is_loaded: guard.is_some(),
            count: guard.as_ref().map(|q| q.len()).unwrap_or(0),
        }
    }

    /// Statistics over the raw records currently in the source. Invalid
    /// records are counted rather than rejected, and the cache is untouched.
    pub async fn integrity_report(&self) -> Result<IntegrityReport, DataAccessError> {
        let raw = self.read_source().await?;
        let doc: Value = serde_json::from_str(&raw)?;
        let records = dataset_records(&doc)?;
        Ok(check_data_integrity(records))
    }

    async fn read_source(&self) -> Result<String, DataAccessError> {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || source.read_raw())
            .await
            .map_err(|e| DataAccessError::Unknown(e.to_string()))?
            .map_err(DataAccessError::from)
    }
}

fn dataset_records(doc: &Value) -> Result<&[Value], DataAccessError> {
    doc.get("quotes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or(DataAccessError::InvalidStructure)
}

/// Parse and validate a `{ "quotes": [...] }` document.
pub fn parse_dataset(raw: &str) -> Result<Vec<Quote>, DataAccessError> {
    let doc: Value = serde_json::from_str(raw)?;
    dataset_records(&doc)?;
    Ok(validate_quotes(&doc["quotes"])?)
}
