//! Record Store
//!
//! Authoritative local copy of incident records. Mutations go to the service
//! first; every successful mutation is followed by a full list refetch, so the
//! local view is always a server snapshot and never an optimistic merge.

use crate::error::{Error, Result};
use crate::model::{IncidentRecord, RecordPatch};
use crate::sync::{HttpRequest, RequestKind, SyncCoordinator, TransportError, ViewScope};
use arc_swap::ArcSwap;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Immutable snapshot of the store, in last-fetch order
///
/// Iterating never touches the store, and the same snapshot can be walked
/// any number of times.
#[derive(Debug, Clone, Default)]
pub struct RecordList(Arc<Vec<IncidentRecord>>);

impl RecordList {
    pub fn iter(&self) -> std::slice::Iter<'_, IncidentRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, equipment_id: &str) -> Option<&IncidentRecord> {
        self.0.iter().find(|r| r.equipment_id == equipment_id)
    }

    pub fn contains(&self, equipment_id: &str) -> bool {
        self.get(equipment_id).is_some()
    }

    pub fn as_slice(&self) -> &[IncidentRecord] {
        &self.0
    }

    /// Whether both lists are the same snapshot
    pub fn ptr_eq(&self, other: &RecordList) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<'a> IntoIterator for &'a RecordList {
    type Item = &'a IncidentRecord;
    type IntoIter = std::slice::Iter<'a, IncidentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Server-side filter for `GET /search`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub equipment_type: Option<String>,
    pub department: Option<String>,
    pub severity: Option<String>,
    pub root_cause: Option<String>,
    pub limit: Option<u32>,
}

impl SearchFilter {
    pub const DEFAULT_LIMIT: u32 = 50;

    fn to_request(&self) -> HttpRequest {
        let mut request = HttpRequest::get("/search");
        let terms = [
            ("equipment_type", &self.equipment_type),
            ("department", &self.department),
            ("severity", &self.severity),
            ("root_cause", &self.root_cause),
        ];
        for (key, value) in terms {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                request = request.query(key, v);
            }
        }
        request.query("limit", self.limit.unwrap_or(Self::DEFAULT_LIMIT).to_string())
    }
}

#[derive(Debug, Deserialize)]
struct RowsResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// Decode rows one by one; a malformed document (no key, blank label, bad date)
/// is skipped rather than failing the list. Unfamiliar labels are not malformed.
fn decode_rows(rows: Vec<serde_json::Value>) -> Vec<IncidentRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<IncidentRecord>(row) {
            Ok(record) => {
                if seen.insert(record.equipment_id.clone()) {
                    records.push(record);
                } else {
                    warn!("Duplicate equipment_id '{}' in listing, keeping first", record.equipment_id);
                }
            }
            Err(e) => warn!("Skipping undecodable record: {}", e),
        }
    }
    records
}

fn keyed_error(err: TransportError, equipment_id: &str) -> Error {
    match err.status() {
        Some(404) => Error::NotFound(equipment_id.to_string()),
        _ => Error::Transport(err),
    }
}

/// The service answers a duplicate create with 400 "... already exists"
fn create_error(err: TransportError, equipment_id: &str) -> Error {
    let duplicate = match &err {
        TransportError::Http { status: 409, .. } => true,
        TransportError::Http { status: 400, detail } => {
            detail.to_lowercase().contains("already exists")
        }
        _ => false,
    };
    if duplicate {
        Error::DuplicateKey(equipment_id.to_string())
    } else {
        Error::Transport(err)
    }
}

fn require_id(equipment_id: &str) -> Result<()> {
    if equipment_id.trim().is_empty() {
        return Err(Error::InvalidInput("equipment_id must not be empty".to_string()));
    }
    Ok(())
}

/// Exclusive owner of the local record list
pub struct RecordStore {
    sync: Arc<SyncCoordinator>,
    records: ArcSwap<Vec<IncidentRecord>>,
    scope: ViewScope,
}

impl RecordStore {
    /// Empty store; call [`RecordStore::refresh`] to load
    pub fn new(sync: Arc<SyncCoordinator>) -> Self {
        Self {
            sync,
            records: ArcSwap::from_pointee(Vec::new()),
            scope: ViewScope::new(),
        }
    }

    /// Current snapshot
    pub fn list(&self) -> RecordList {
        RecordList(self.records.load_full())
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Stop applying results; requests already sent still complete
    pub fn close(&self) {
        self.scope.close();
    }

    /// Replace the local list with the service's full listing
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<RecordList> {
        let response: RowsResponse = self
            .sync
            .fetch(RequestKind::ListRecords, HttpRequest::get("/all-data"))
            .await?;
        let snapshot = Arc::new(decode_rows(response.data));

        if !self.scope.is_active() {
            debug!("Record store closed, discarding listing of {} records", snapshot.len());
            return Ok(RecordList(snapshot));
        }

        info!("Record store refreshed: {} records", snapshot.len());
        self.records.store(snapshot.clone());
        Ok(RecordList(snapshot))
    }

    /// Create a record; fails with `DuplicateKey` if the id is taken
    pub async fn add(&self, record: IncidentRecord) -> Result<RecordList> {
        record.validate()?;
        let request = HttpRequest::post("/add-record").with_json(&record)?;

        self.sync
            .execute(RequestKind::AddRecord, request)
            .await
            .map_err(|e| create_error(e, &record.equipment_id))?;

        info!("Added record {}", record.equipment_id);
        Ok(self.refetch_after("add").await)
    }

    /// Apply a partial update; fails with `NotFound` if the id is unknown
    pub async fn update(&self, equipment_id: &str, patch: RecordPatch) -> Result<RecordList> {
        require_id(equipment_id)?;
        patch.validate()?;
        let request = HttpRequest::put("/update-record")
            .segment(equipment_id)
            .with_json(&patch)?;

        self.sync
            .execute(RequestKind::UpdateRecord, request)
            .await
            .map_err(|e| keyed_error(e, equipment_id))?;

        info!("Updated record {}", equipment_id);
        Ok(self.refetch_after("update").await)
    }

    /// Overwrite every mutable field of an existing record
    pub async fn replace(&self, record: &IncidentRecord) -> Result<RecordList> {
        record.validate()?;
        self.update(&record.equipment_id, RecordPatch::from_record(record))
            .await
    }

    /// Delete a record; fails with `NotFound` if the id is unknown
    pub async fn remove(&self, equipment_id: &str) -> Result<RecordList> {
        require_id(equipment_id)?;
        let request = HttpRequest::delete("/delete-record").segment(equipment_id);

        self.sync
            .execute(RequestKind::DeleteRecord, request)
            .await
            .map_err(|e| keyed_error(e, equipment_id))?;

        info!("Deleted record {}", equipment_id);
        Ok(self.refetch_after("delete").await)
    }

    /// Read one record straight from the service; the local list is untouched
    pub async fn fetch(&self, equipment_id: &str) -> Result<IncidentRecord> {
        require_id(equipment_id)?;
        let request = HttpRequest::get("/record").segment(equipment_id);
        self.sync
            .fetch(RequestKind::FetchRecord, request)
            .await
            .map_err(|e| keyed_error(e, equipment_id))
    }

    /// Server-side search; results are returned, not stored
    pub async fn search(&self, filter: &SearchFilter) -> Result<Vec<IncidentRecord>> {
        let response: RowsResponse = self
            .sync
            .fetch(RequestKind::SearchRecords, filter.to_request())
            .await?;
        Ok(decode_rows(response.data))
    }

    /// The mutation already succeeded remotely, so a failed refetch only leaves
    /// the view stale; the list request's status carries the failure.
    async fn refetch_after(&self, operation: &str) -> RecordList {
        match self.refresh().await {
            Ok(list) => list,
            Err(e) => {
                warn!("Refetch after {} failed, local view is stale: {}", operation, e);
                self.list()
            }
        }
    }
}
