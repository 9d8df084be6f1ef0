//! In-memory emulation of the analysis service
//!
//! Answers the same routes with the same status codes and body shapes, backed
//! by a plain vector of JSON documents.

#![allow(dead_code)]

use async_trait::async_trait;
use fivewhy_core::sync::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

const RECORD_FIELDS: [&str; 13] = [
    "equipment_id",
    "equipment_type",
    "department",
    "severity",
    "issue",
    "root_cause",
    "why1",
    "why2",
    "why3",
    "why4",
    "why5",
    "solution",
    "date_reported",
];

#[derive(Default)]
struct State {
    records: Vec<Map<String, Value>>,
    offline: bool,
    failing: HashSet<String>,
    calls: Vec<String>,
}

#[derive(Default)]
pub struct ServiceEmulator {
    state: Mutex<State>,
}

impl ServiceEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored document directly, bypassing validation
    pub fn seed(&self, document: Value) {
        if let Value::Object(map) = document {
            self.state().records.push(map);
        }
    }

    /// Every request fails at the network level while set
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Answer this route with 500 until cleared
    pub fn fail_route(&self, route: &str) {
        self.state().failing.insert(route.to_string());
    }

    pub fn clear_failures(&self) {
        self.state().failing.clear();
    }

    pub fn record_count(&self) -> usize {
        self.state().records.len()
    }

    /// Stored document for an id, as the service holds it
    pub fn document(&self, equipment_id: &str) -> Option<Map<String, Value>> {
        let state = self.state();
        find(&state.records, equipment_id).map(|index| state.records[index].clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        let mut state = self.state();
        let route = request.route();
        state.calls.push(format!("{} {}", request.method, route));

        if state.failing.contains(&route) {
            return detail(500, "Internal Server Error");
        }

        let segments: Vec<&str> = request.segments.iter().map(String::as_str).collect();
        match (request.method, segments.as_slice()) {
            (Method::Get, ["health"]) => ok(json!({
                "status": "healthy",
                "model": "loaded",
                "database": "connected",
                "records": state.records.len(),
            })),
            (Method::Get, ["all-data"]) => ok(json!({
                "data": state.records,
                "count": state.records.len(),
            })),
            (Method::Get, ["record", id]) => match find(&state.records, id) {
                Some(index) => ok(Value::Object(state.records[index].clone())),
                None => detail(404, "Record not found"),
            },
            (Method::Post, ["add-record"]) => add(&mut state.records, request.body.as_ref()),
            (Method::Put, ["update-record", id]) => update(&mut state.records, id, request.body.as_ref()),
            (Method::Delete, ["delete-record", id]) => match find(&state.records, id) {
                Some(index) => {
                    state.records.remove(index);
                    ok(json!({"message": "Record deleted successfully"}))
                }
                None => detail(404, "Record not found"),
            },
            (Method::Get, ["search"]) => search(&state.records, &request.query),
            (Method::Post, ["predict"]) => predict(request.body.as_ref(), false),
            (Method::Post, ["predict-enhanced"]) => predict(request.body.as_ref(), true),
            (Method::Get, ["analytics", "summary"]) => summary(&state.records),
            (Method::Get, ["analytics", "plots"]) => plots(&state.records),
            (Method::Get, ["analytics", "trends"]) => trends(&state.records),
            (Method::Get, ["analytics", "department-stats"]) => ok(json!({
                "department_stats": cross_tab(&state.records, "department", "severity"),
            })),
            (Method::Get, ["analytics", "root-cause-stats"]) => ok(json!({
                "root_cause_stats": cross_tab(&state.records, "root_cause", "equipment_type"),
            })),
            (Method::Get, ["export", "csv"]) => export_csv(&state.records),
            (Method::Get, ["root-causes"]) => distinct(&state.records, "root_cause", "root_causes"),
            (Method::Get, ["equipment-types"]) => {
                distinct(&state.records, "equipment_type", "equipment_types")
            }
            (Method::Get, ["departments"]) => distinct(&state.records, "department", "departments"),
            _ => detail(404, "Not Found"),
        }
    }
}

#[async_trait]
impl Transport for ServiceEmulator {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if self.state().offline {
            return Err(TransportError::Network("connection refused".to_string()));
        }
        Ok(self.handle(request))
    }
}

fn ok(body: Value) -> HttpResponse {
    HttpResponse::new(200, body.to_string())
}

fn detail(status: u16, message: &str) -> HttpResponse {
    HttpResponse::new(status, json!({ "detail": message }).to_string())
}

fn text(record: &Map<String, Value>, field: &str) -> String {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn find(records: &[Map<String, Value>], id: &str) -> Option<usize> {
    records.iter().position(|r| text(r, "equipment_id") == id)
}

fn add(records: &mut Vec<Map<String, Value>>, body: Option<&Value>) -> HttpResponse {
    let Some(Value::Object(body)) = body else {
        return detail(422, "Invalid body");
    };
    let id = text(body, "equipment_id");
    if find(records, &id).is_some() {
        return detail(400, &format!("Equipment ID {} already exists", id));
    }

    let mut document = Map::new();
    for field in RECORD_FIELDS {
        let value = body.get(field).cloned().unwrap_or_else(|| json!(""));
        document.insert(field.to_string(), value);
    }
    records.push(document);
    ok(json!({"message": "Record added successfully", "equipment_id": id}))
}

fn update(records: &mut [Map<String, Value>], id: &str, body: Option<&Value>) -> HttpResponse {
    let Some(Value::Object(body)) = body else {
        return detail(422, "Invalid body");
    };
    let changes: Map<String, Value> = body
        .iter()
        .filter(|(k, v)| !v.is_null() && k.as_str() != "equipment_id")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if changes.is_empty() {
        return detail(400, "No fields to update");
    }
    let Some(index) = find(records, id) else {
        return detail(404, "Record not found");
    };
    records[index].extend(changes);
    ok(json!({"message": "Record updated successfully"}))
}

fn search(records: &[Map<String, Value>], query: &[(String, String)]) -> HttpResponse {
    let mut limit = 50;
    let mut terms = Vec::new();
    for (key, value) in query {
        if key == "limit" {
            limit = value.parse().unwrap_or(50);
        } else {
            terms.push((key.as_str(), value.to_lowercase()));
        }
    }
    let data: Vec<Value> = records
        .iter()
        .filter(|r| {
            terms
                .iter()
                .all(|(field, needle)| text(r, field).to_lowercase().contains(needle.as_str()))
        })
        .take(limit)
        .map(|r| Value::Object(r.clone()))
        .collect();
    ok(json!({ "data": data, "count": data.len() }))
}

fn predict(body: Option<&Value>, enhanced: bool) -> HttpResponse {
    let description = body
        .and_then(|b| b.get("description"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    if description.len() < 5 {
        return detail(400, "Description must be at least 5 characters");
    }

    let (cause, why1, solution) = if description.contains("motor") || description.contains("bearing") {
        ("Bearing wear", "Excess friction in the bearing", "Replace and lubricate bearing")
    } else if description.contains("leak") {
        ("Seal failure", "Seal no longer holds pressure", "Replace pump seal")
    } else {
        ("Operator error", "Procedure not followed", "Retrain operators")
    };
    let five_why = json!({
        "why1": why1,
        "why2": "Preventive maintenance was skipped",
        "why3": "",
        "why4": "",
        "why5": "",
        "solution": solution,
    });

    if enhanced {
        ok(json!({
            "prediction": cause,
            "confidence": 0.82,
            "five_why": five_why,
            "top_predictions": [
                {"root_cause": cause, "confidence": 0.82},
                {"root_cause": "Misalignment", "confidence": 0.11},
            ],
            "sample_matches": 14,
        }))
    } else {
        ok(json!({ "prediction": cause, "five_why": five_why }))
    }
}

/// Label → count, most frequent first (ties in first-seen order)
fn counts(records: &[Map<String, Value>], field: &str) -> Map<String, Value> {
    let mut tally: Vec<(String, u64)> = Vec::new();
    for record in records {
        let label = text(record, field);
        match tally.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => tally.push((label, 1)),
        }
    }
    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally.into_iter().map(|(l, n)| (l, json!(n))).collect()
}

fn summary(records: &[Map<String, Value>]) -> HttpResponse {
    if records.is_empty() {
        return ok(json!({"error": "No data available"}));
    }
    ok(json!({
        "total_records": records.len(),
        "departments": counts(records, "department"),
        "severity": counts(records, "severity"),
        "top_root_causes": counts(records, "root_cause"),
        "equipment_types": counts(records, "equipment_type"),
    }))
}

fn plots(records: &[Map<String, Value>]) -> HttpResponse {
    if records.is_empty() {
        return ok(json!({"error": "No data available"}));
    }
    let severity = counts(records, "severity");
    ok(json!({
        "severity_chart": {
            "data": [{"type": "pie", "labels": severity.keys().collect::<Vec<_>>(),
                      "values": severity.values().collect::<Vec<_>>()}],
            "layout": {"title": "Severity distribution"},
        },
        "shift_chart": null,
        "stats": {"total_records": records.len(), "unique_causes": counts(records, "root_cause").len()},
    }))
}

fn trends(records: &[Map<String, Value>]) -> HttpResponse {
    let mut months: Vec<(String, u64)> = Vec::new();
    for record in records {
        let month: String = text(record, "date_reported").chars().take(7).collect();
        match months.iter_mut().find(|(m, _)| *m == month) {
            Some((_, n)) => *n += 1,
            None => months.push((month, 1)),
        }
    }
    months.sort();
    let series: Map<String, Value> = months.into_iter().map(|(m, n)| (m, json!(n))).collect();
    ok(json!({ "monthly_trends": series }))
}

fn distinct(records: &[Map<String, Value>], field: &str, key: &str) -> HttpResponse {
    let mut values: Vec<String> = records.iter().map(|r| text(r, field)).collect();
    values.sort();
    values.dedup();
    let mut body = Map::new();
    body.insert(key.to_string(), json!(values));
    ok(Value::Object(body))
}

/// `groupby([row, column]).size().unstack(fill_value=0)`: column → row → count,
/// both axes sorted, missing cells zero
fn cross_tab(records: &[Map<String, Value>], row: &str, column: &str) -> Map<String, Value> {
    let mut rows: Vec<String> = records.iter().map(|r| text(r, row)).collect();
    rows.sort();
    rows.dedup();
    let mut columns: Vec<String> = records.iter().map(|r| text(r, column)).collect();
    columns.sort();
    columns.dedup();

    columns
        .into_iter()
        .map(|c| {
            let cells: Map<String, Value> = rows
                .iter()
                .map(|r| {
                    let n = records
                        .iter()
                        .filter(|rec| text(rec, row) == *r && text(rec, column) == c)
                        .count();
                    (r.clone(), json!(n))
                })
                .collect();
            (c, Value::Object(cells))
        })
        .collect()
}

fn export_csv(records: &[Map<String, Value>]) -> HttpResponse {
    if records.is_empty() {
        return detail(404, "No data to export");
    }
    let mut csv = RECORD_FIELDS.join(",");
    csv.push('\n');
    for record in records {
        let line: Vec<String> = RECORD_FIELDS.iter().map(|f| text(record, f)).collect();
        csv.push_str(&line.join(","));
        csv.push('\n');
    }
    HttpResponse::new(200, csv)
}
