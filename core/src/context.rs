//! Application state container
//!
//! Everything the UI layer talks to, wired around one shared coordinator.

use crate::analytics::AnalyticsViewModel;
use crate::catalog::CatalogClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::model::ServiceHealth;
use crate::prediction::{FileHistoryStorage, HistoryStorage, PredictionClient};
use crate::store::RecordStore;
use crate::suggest::{StaticVocabulary, SuggestionSource};
use crate::sync::{HttpRequest, HttpTransport, RequestKind, SyncCoordinator, Transport};
use std::sync::Arc;
use tracing::info;

pub struct AppContext {
    sync: Arc<SyncCoordinator>,
    pub records: RecordStore,
    pub predictions: PredictionClient,
    pub analytics: AnalyticsViewModel,
    pub catalog: CatalogClient,
    pub suggestions: Box<dyn SuggestionSource>,
}

impl AppContext {
    /// HTTP transport and file-backed history, both taken from `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.service.base_url, config.service.timeout())?;
        let storage = FileHistoryStorage::new(
            config.storage.resolved_data_dir(),
            &config.storage.history_key,
        );
        info!(
            "Client for {} (history at {:?})",
            config.service.base_url,
            storage.path()
        );
        Ok(Self::from_parts(Arc::new(transport), Arc::new(storage)))
    }

    /// Empty record store, history loaded from `storage`, default vocabulary
    pub fn from_parts(transport: Arc<dyn Transport>, storage: Arc<dyn HistoryStorage>) -> Self {
        let sync = Arc::new(SyncCoordinator::new(transport));
        Self {
            records: RecordStore::new(sync.clone()),
            predictions: PredictionClient::new(sync.clone(), storage),
            analytics: AnalyticsViewModel::new(sync.clone()),
            catalog: CatalogClient::new(sync.clone()),
            suggestions: Box::new(StaticVocabulary::default()),
            sync,
        }
    }

    /// Swap the suggestion matcher without touching callers
    pub fn with_suggestions(mut self, source: Box<dyn SuggestionSource>) -> Self {
        self.suggestions = source;
        self
    }

    pub fn sync(&self) -> &Arc<SyncCoordinator> {
        &self.sync
    }

    pub fn suggest(&self, query: &str) -> Vec<String> {
        self.suggestions.suggest(query)
    }

    pub async fn health(&self) -> Result<ServiceHealth> {
        Ok(self
            .sync
            .fetch(RequestKind::Health, HttpRequest::get("/health"))
            .await?)
    }

    /// Close every view scope; in-flight results are discarded on arrival
    pub fn shutdown(&self) {
        self.records.close();
        self.analytics.close();
    }
}
