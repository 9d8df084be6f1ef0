//! Prediction Engine Client
//!
//! Sends free-text issue descriptions to the prediction endpoints and keeps
//! a small persisted history of what was asked and what came back.

pub mod history;

pub use history::{
    FileHistoryStorage, HistoryStorage, MemoryHistoryStorage, PredictionHistory,
    DEFAULT_HISTORY_KEY, HISTORY_CAPACITY,
};

use crate::error::{Error, Result};
use crate::model::prediction::PredictRequest;
use crate::model::{EnhancedPrediction, PredictionContext, PredictionHistoryEntry, PredictionResult};
use crate::sync::{HttpRequest, RequestKind, SyncCoordinator};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct PredictionClient {
    sync: Arc<SyncCoordinator>,
    storage: Arc<dyn HistoryStorage>,
    history: Mutex<PredictionHistory>,
}

impl PredictionClient {
    /// Build the client and load whatever history the storage holds
    pub fn new(sync: Arc<SyncCoordinator>, storage: Arc<dyn HistoryStorage>) -> Self {
        let history = PredictionHistory::load(storage.as_ref());
        Self {
            sync,
            storage,
            history: Mutex::new(history),
        }
    }

    /// Re-read persisted history; bad state resets to empty instead of failing
    pub async fn load_history(&self) -> PredictionHistory {
        let loaded = PredictionHistory::load(self.storage.as_ref());
        let mut guard = self.history.lock().await;
        *guard = loaded.clone();
        loaded
    }

    /// Snapshot of the in-memory history, newest first
    pub async fn history(&self) -> PredictionHistory {
        self.history.lock().await.clone()
    }

    /// Predict the root cause for an issue description
    ///
    /// Blank input fails with `InvalidInput` before any request is made.
    /// On failure the history is left exactly as it was.
    pub async fn predict(&self, description: &str) -> Result<PredictionResult> {
        let description = normalize(description)?;
        let request = HttpRequest::post("/predict").with_json(&PredictRequest {
            description,
            context: None,
        })?;

        let result: PredictionResult = self.sync.fetch(RequestKind::Predict, request).await?;
        info!("Predicted '{}' for issue '{}'", result.prediction, description);

        self.remember(description, &result).await;
        Ok(result)
    }

    /// Predict with operating conditions, returning confidence and alternatives
    pub async fn predict_with_context(
        &self,
        description: &str,
        context: &PredictionContext,
    ) -> Result<EnhancedPrediction> {
        let description = normalize(description)?;
        let request = HttpRequest::post("/predict-enhanced").with_json(&PredictRequest {
            description,
            context: Some(context),
        })?;

        let result: EnhancedPrediction = self.sync.fetch(RequestKind::Predict, request).await?;
        info!(
            "Predicted '{}' ({:.2}) for issue '{}'",
            result.prediction, result.confidence, description
        );

        self.remember(description, &result.to_result()).await;
        Ok(result)
    }

    /// Drop every entry, in memory and in storage
    pub async fn clear_history(&self) -> Result<()> {
        let mut guard = self.history.lock().await;
        let empty = PredictionHistory::default();
        empty.persist(self.storage.as_ref())?;
        *guard = empty;
        info!("Prediction history cleared");
        Ok(())
    }

    /// Prepend, trim and persist as one step
    ///
    /// The in-memory history only changes once the write went through, so
    /// memory and storage never disagree. A failed write is logged; the
    /// prediction itself is still returned to the caller.
    async fn remember(&self, description: &str, result: &PredictionResult) {
        let mut guard = self.history.lock().await;
        let mut next = guard.clone();
        let timestamp = next.next_timestamp(Utc::now());
        next.record(PredictionHistoryEntry::new(description, result, timestamp));

        match next.persist(self.storage.as_ref()) {
            Ok(()) => {
                debug!("Prediction history now holds {} entries", next.len());
                *guard = next;
            }
            Err(e) => warn!("Failed to persist prediction history: {}", e),
        }
    }
}

fn normalize(description: &str) -> Result<&str> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "issue description must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}
