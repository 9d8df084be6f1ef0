//! Aggregate snapshots returned by the analytics endpoints

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Label → count pairs in the order the service sent them
///
/// The service emits counts in descending frequency (or chronological order for
/// trends); a hash or sorted map would lose that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedCounts(Vec<(String, u64)>);

impl OrderedCounts {
    pub fn get(&self, label: &str) -> Option<u64> {
        self.0.iter().find(|(k, _)| k == label).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, v)| v).sum()
    }
}

impl FromIterator<(String, u64)> for OrderedCounts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for OrderedCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrderedCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountsVisitor;

        impl<'de> Visitor<'de> for CountsVisitor {
            type Value = OrderedCounts;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of label to count")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, count)) = access.next_entry::<String, u64>()? {
                    entries.push((label, count));
                }
                Ok(OrderedCounts(entries))
            }
        }

        deserializer.deserialize_map(CountsVisitor)
    }
}

/// Two-way count table: column label → (row label → count), in service order
///
/// Built from a grouped, unstacked frame, so every column carries the same row
/// labels and absent combinations count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossTab(Vec<(String, OrderedCounts)>);

impl CrossTab {
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn column(&self, label: &str) -> Option<&OrderedCounts> {
        self.0.iter().find(|(k, _)| k == label).map(|(_, v)| v)
    }

    /// Count for one cell; missing cells are zero
    pub fn get(&self, column: &str, row: &str) -> u64 {
        self.column(column).and_then(|c| c.get(row)).unwrap_or(0)
    }

    /// Row labels in first-seen order across all columns
    pub fn rows(&self) -> Vec<&str> {
        let mut rows: Vec<&str> = Vec::new();
        for (_, counts) in &self.0 {
            for label in counts.labels() {
                if !rows.contains(&label) {
                    rows.push(label);
                }
            }
        }
        rows
    }

    /// Sum of one row across every column
    pub fn row_total(&self, row: &str) -> u64 {
        self.0.iter().filter_map(|(_, c)| c.get(row)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OrderedCounts)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CrossTab {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CrossTab {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CrossTabVisitor;

        impl<'de> Visitor<'de> for CrossTabVisitor {
            type Value = CrossTab;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of column label to counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut columns = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, OrderedCounts>()? {
                    columns.push(entry);
                }
                Ok(CrossTab(columns))
            }
        }

        deserializer.deserialize_map(CrossTabVisitor)
    }
}

/// Severity → (department → count) (`GET /analytics/department-stats`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepartmentStats {
    #[serde(default)]
    pub department_stats: CrossTab,
}

/// Equipment type → (root cause → count) (`GET /analytics/root-cause-stats`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootCauseStats {
    #[serde(default)]
    pub root_cause_stats: CrossTab,
}

/// Read-only aggregate snapshot (`GET /analytics/summary`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_records: u64,
    #[serde(default)]
    pub departments: OrderedCounts,
    #[serde(default)]
    pub severity: OrderedCounts,
    #[serde(default)]
    pub top_root_causes: OrderedCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_types: Option<OrderedCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_times: Option<OrderedCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_buckets: Option<OrderedCounts>,
}

/// Chart payload, passed through unmodified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPayload {
    pub data: serde_json::Value,
    #[serde(default)]
    pub layout: serde_json::Value,
}

/// Plot name → payload (`GET /analytics/plots`)
///
/// Charts the service could not compute arrive as `null` and are left out.
/// The `stats` block is kept beside the plots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Map<String, serde_json::Value>")]
pub struct PlotSet {
    pub plots: BTreeMap<String, PlotPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<serde_json::Value>,
}

impl PlotSet {
    pub fn get(&self, name: &str) -> Option<&PlotPayload> {
        self.plots.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.plots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for PlotSet {
    type Error = serde_json::Error;

    fn try_from(raw: serde_json::Map<String, serde_json::Value>) -> Result<Self, Self::Error> {
        let mut set = PlotSet::default();
        for (name, value) in raw {
            if name == "stats" {
                set.stats = Some(value);
                continue;
            }
            let is_plot = value
                .as_object()
                .map(|obj| obj.contains_key("data"))
                .unwrap_or(false);
            if is_plot {
                set.plots.insert(name, serde_json::from_value(value)?);
            }
        }
        Ok(set)
    }
}

/// Month (`YYYY-MM`) → count, chronological (`GET /analytics/trends`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrends {
    #[serde(default)]
    pub monthly_trends: OrderedCounts,
}

/// Service liveness (`GET /health`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub records: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cross_tab_reads_unstacked_frame() {
        let body = json!({"department_stats": {
            "High": {"Maintenance": 3, "Safety": 1},
            "Low": {"Maintenance": 0, "Safety": 2}
        }});
        let stats: DepartmentStats = serde_json::from_value(body).unwrap();
        let table = &stats.department_stats;
        assert_eq!(table.columns().collect::<Vec<_>>(), vec!["High", "Low"]);
        assert_eq!(table.rows(), vec!["Maintenance", "Safety"]);
        assert_eq!(table.get("High", "Safety"), 1);
        assert_eq!(table.get("Critical", "Safety"), 0);
        assert_eq!(table.row_total("Safety"), 3);

        let empty: RootCauseStats = serde_json::from_value(json!({"root_cause_stats": {}})).unwrap();
        assert!(empty.root_cause_stats.is_empty());
    }

    #[test]
    fn test_counts_keep_service_order() {
        let body = r#"{"Misalignment": 12, "Bearing wear": 9, "Seal failure": 3}"#;
        let counts: OrderedCounts = serde_json::from_str(body).unwrap();
        let labels: Vec<_> = counts.labels().collect();
        assert_eq!(labels, vec!["Misalignment", "Bearing wear", "Seal failure"]);
        assert_eq!(counts.get("Bearing wear"), Some(9));
        assert_eq!(counts.total(), 24);
        assert_eq!(serde_json::to_string(&counts).unwrap(), body.replace(", ", ",").replace(": ", ":"));
    }

    #[test]
    fn test_summary_optional_sections() {
        let summary: AnalyticsSummary = serde_json::from_value(json!({
            "total_records": 3,
            "departments": {"Maintenance": 2, "Quality": 1},
            "severity": {"High": 3},
            "top_root_causes": {"Bearing wear": 3}
        }))
        .unwrap();
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.departments.total(), 3);
        assert!(summary.equipment_types.is_none());
    }

    #[test]
    fn test_plot_set_skips_nulls_and_keeps_stats() {
        let plots: PlotSet = serde_json::from_value(json!({
            "severity_chart": {"data": [{"type": "pie"}], "layout": {"title": "Severity"}},
            "trend_chart": null,
            "stats": {"total_records": 10, "unique_causes": 4}
        }))
        .unwrap();
        assert_eq!(plots.len(), 1);
        assert_eq!(plots.get("severity_chart").unwrap().layout["title"], json!("Severity"));
        assert!(plots.get("trend_chart").is_none());
        assert_eq!(plots.stats.as_ref().unwrap()["unique_causes"], json!(4));
    }
}
