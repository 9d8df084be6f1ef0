//! Prediction payloads and history entries

use crate::model::record::FiveWhy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Predicted root cause with its synthesized 5-Why chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: String,
    #[serde(default)]
    pub five_why: FiveWhy,
}

/// Body of `POST /predict`
#[derive(Debug, Serialize)]
pub(crate) struct PredictRequest<'a> {
    pub description: &'a str,
    #[serde(flatten)]
    pub context: Option<&'a PredictionContext>,
}

/// Operating conditions accepted by `POST /predict-enhanced`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionContext {
    pub environment: String,
    pub operating_load: String,
    pub recent_maintenance: String,
    pub severity: String,
    pub shift_time: String,
    pub machine_age_bucket: String,
    pub maintenance_gap_days: String,
    pub failure_frequency: String,
}

impl Default for PredictionContext {
    fn default() -> Self {
        Self {
            environment: "clean".to_string(),
            operating_load: "normal".to_string(),
            recent_maintenance: "yes".to_string(),
            severity: "medium".to_string(),
            shift_time: "day".to_string(),
            machine_age_bucket: "mid".to_string(),
            maintenance_gap_days: "moderate".to_string(),
            failure_frequency: "medium".to_string(),
        }
    }
}

/// Alternative cause ranked by model confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCause {
    pub root_cause: String,
    pub confidence: f64,
}

/// Response of `POST /predict-enhanced`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedPrediction {
    pub prediction: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub five_why: FiveWhy,
    #[serde(default)]
    pub top_predictions: Vec<RankedCause>,
    #[serde(default)]
    pub sample_matches: u32,
}

impl EnhancedPrediction {
    /// The plain prediction part, as recorded in history
    pub fn to_result(&self) -> PredictionResult {
        PredictionResult {
            prediction: self.prediction.clone(),
            five_why: self.five_why.clone(),
        }
    }
}

/// One remembered issue → predicted-cause interaction; never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionHistoryEntry {
    pub description: String,
    pub prediction: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub five_why: FiveWhy,
}

impl PredictionHistoryEntry {
    pub fn new(description: &str, result: &PredictionResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            description: description.to_string(),
            prediction: result.prediction.clone(),
            timestamp,
            five_why: result.five_why.clone(),
        }
    }

    /// Description cut to `max_chars` characters, with an ellipsis when cut
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.description.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}
