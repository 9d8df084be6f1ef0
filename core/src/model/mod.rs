//! Data model shared by the components

pub mod analytics;
pub mod prediction;
pub mod record;

pub use analytics::{
    AnalyticsSummary, CrossTab, DepartmentStats, MonthlyTrends, OrderedCounts, PlotPayload, PlotSet,
    RootCauseStats, ServiceHealth,
};
pub use prediction::{
    EnhancedPrediction, PredictionContext, PredictionHistoryEntry, PredictionResult, RankedCause,
};
pub use record::{
    Department, EquipmentType, FiveWhy, IncidentRecord, ParseLabelError, RecordPatch, Severity,
};
