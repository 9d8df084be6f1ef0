//! FiveWhy Core Module
//!
//! Client-side state and sync layer for the 5-Why root-cause analysis service:
//! the incident record store, the prediction client with its persisted history,
//! the suggestion index and the analytics view model, all talking to the
//! service through one sync coordinator.

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod prediction;
pub mod store;
pub mod suggest;
pub mod sync;

pub use analytics::{AnalyticsRefresh, AnalyticsViewModel};
pub use catalog::{Catalog, CatalogClient};
pub use config::{ClientConfig, ConfigFormat, ConfigManager};
pub use context::AppContext;
pub use error::{Error, Result};
pub use model::{
    AnalyticsSummary, CrossTab, Department, DepartmentStats, EnhancedPrediction, EquipmentType,
    FiveWhy, IncidentRecord, MonthlyTrends, PlotPayload, PlotSet, PredictionContext,
    PredictionHistoryEntry,
    PredictionResult, RankedCause, RecordPatch, RootCauseStats, ServiceHealth, Severity,
};
pub use prediction::{
    FileHistoryStorage, HistoryStorage, MemoryHistoryStorage, PredictionClient, PredictionHistory,
};
pub use store::{RecordList, RecordStore, SearchFilter};
pub use suggest::{StaticVocabulary, SuggestionSource};
pub use sync::{
    RequestKind, RequestState, SyncCoordinator, SyncEvent, Transport, TransportError, ViewScope,
};
