//! Output rendering
//!
//! Plain text for people, pretty JSON for scripts. Renderers return strings so
//! dispatch decides where they go.

use fivewhy_core::{
    AnalyticsSummary, CrossTab, EnhancedPrediction, FiveWhy, IncidentRecord, MonthlyTrends, PlotSet,
    PredictionHistory, PredictionResult, ServiceHealth,
};
use serde::Serialize;
use std::fmt::Write;

const PREVIEW_CHARS: usize = 50;

pub fn json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

pub fn record_table(records: &[IncidentRecord]) -> String {
    if records.is_empty() {
        return "No records".to_string();
    }
    let mut out = format!(
        "{:<14} {:<11} {:<12} {:<9} {:<11} {}\n",
        "EQUIPMENT", "TYPE", "DEPARTMENT", "SEVERITY", "REPORTED", "ROOT CAUSE"
    );
    for r in records {
        let _ = writeln!(
            out,
            "{:<14} {:<11} {:<12} {:<9} {:<11} {}",
            r.equipment_id,
            r.equipment_type.as_str(),
            r.department.as_str(),
            r.severity.as_str(),
            r.date_reported.to_string(),
            r.root_cause
        );
    }
    let _ = write!(out, "{} record(s)", records.len());
    out
}

pub fn record_detail(record: &IncidentRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Equipment:   {}", record.equipment_id);
    let _ = writeln!(out, "Type:        {}", record.equipment_type);
    let _ = writeln!(out, "Department:  {}", record.department);
    let _ = writeln!(out, "Severity:    {}", record.severity);
    let _ = writeln!(out, "Reported:    {}", record.date_reported);
    let _ = writeln!(out, "Issue:       {}", record.issue);
    let _ = writeln!(out, "Root cause:  {}", record.root_cause);
    out.push_str(&chain(&record.chain));
    out.trim_end().to_string()
}

fn chain(chain: &FiveWhy) -> String {
    let mut out = String::new();
    for (n, why) in chain.whys().iter().enumerate() {
        if let Some(text) = why {
            let _ = writeln!(out, "  Why {}: {}", n + 1, text);
        }
    }
    if let Some(solution) = &chain.solution {
        let _ = writeln!(out, "  Solution: {}", solution);
    }
    if chain.has_gaps() {
        out.push_str("  (chain has gaps)\n");
    }
    out
}

pub fn prediction(result: &PredictionResult) -> String {
    let mut out = format!("Predicted root cause: {}\n", result.prediction);
    out.push_str(&chain(&result.five_why));
    out.trim_end().to_string()
}

pub fn enhanced_prediction(result: &EnhancedPrediction) -> String {
    let mut out = format!(
        "Predicted root cause: {} ({:.0}% confidence, {} similar incidents)\n",
        result.prediction,
        result.confidence * 100.0,
        result.sample_matches
    );
    out.push_str(&chain(&result.five_why));
    if !result.top_predictions.is_empty() {
        out.push_str("Alternatives:\n");
        for alt in &result.top_predictions {
            let _ = writeln!(out, "  {:>5.1}%  {}", alt.confidence * 100.0, alt.root_cause);
        }
    }
    out.trim_end().to_string()
}

pub fn history(history: &PredictionHistory) -> String {
    if history.is_empty() {
        return "No predictions yet".to_string();
    }
    history
        .entries()
        .iter()
        .map(|e| {
            format!(
                "{}  {} -> {}",
                e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                e.preview(PREVIEW_CHARS),
                e.prediction
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn lines(values: &[String], empty: &str) -> String {
    if values.is_empty() {
        empty.to_string()
    } else {
        values.join("\n")
    }
}

pub fn summary(summary: &AnalyticsSummary) -> String {
    let mut out = format!("Total records: {}\n", summary.total_records);
    let mut section = |title: &str, counts: &fivewhy_core::model::OrderedCounts| {
        if counts.is_empty() {
            return;
        }
        let _ = writeln!(out, "{}:", title);
        for (label, count) in counts.iter() {
            let _ = writeln!(out, "  {:<28} {:>6}", label, count);
        }
    };
    section("Departments", &summary.departments);
    section("Severity", &summary.severity);
    section("Top root causes", &summary.top_root_causes);
    if let Some(counts) = &summary.equipment_types {
        section("Equipment types", counts);
    }
    if let Some(counts) = &summary.shift_times {
        section("Shift times", counts);
    }
    if let Some(counts) = &summary.age_buckets {
        section("Machine age", counts);
    }
    out.trim_end().to_string()
}

pub fn plots(plots: &PlotSet) -> String {
    let mut out = String::new();
    if plots.is_empty() {
        out.push_str("No plots available\n");
    }
    for name in plots.names() {
        let _ = writeln!(out, "{}", name);
    }
    if let Some(stats) = &plots.stats {
        let _ = writeln!(out, "stats: {}", stats);
    }
    out.trim_end().to_string()
}

pub fn trends(trends: &MonthlyTrends) -> String {
    if trends.monthly_trends.is_empty() {
        return "No trend data".to_string();
    }
    trends
        .monthly_trends
        .iter()
        .map(|(month, count)| format!("{}  {:>5}", month, count))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per row label, one column per column label, zero-filled
pub fn cross_tab(table: &CrossTab, row_heading: &str, empty: &str) -> String {
    if table.is_empty() {
        return empty.to_string();
    }
    let columns: Vec<&str> = table.columns().collect();
    let mut out = format!("{:<32}", row_heading);
    for column in &columns {
        let _ = write!(out, " {:>10}", column);
    }
    for row in table.rows() {
        let _ = write!(out, "\n{:<32}", row);
        for column in &columns {
            let _ = write!(out, " {:>10}", table.get(column, row));
        }
    }
    out
}

pub fn health(health: &ServiceHealth) -> String {
    format!(
        "status: {}\nmodel: {}\ndatabase: {}\nrecords: {}",
        health.status, health.model, health.database, health.records
    )
}
