//! Sync coordinator
//!
//! Mediates every remote call, classifies failures uniformly and reports
//! loading/error status. Holds no business data.
//!
//! # Request lifecycle
//!
//! ```text
//!   IDLE ──(begin)──▶ IN_FLIGHT ──(2xx, body decoded)──────────────▶ SUCCEEDED
//!                         │
//!                         └──(transport error, non-2xx, bad body)──▶ FAILED
//! ```
//!
//! - **IDLE**: no request of this kind has been issued yet
//! - **IN_FLIGHT**: awaiting a response
//! - **SUCCEEDED** / **FAILED**: terminal; there are no automatic retries
//!
//! Concurrent requests of the same kind each run to completion; the status
//! reported for a kind is that of the last one to finish.

use crate::sync::transport_types::{HttpRequest, Transport, TransportError};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

const EVENT_CAPACITY: usize = 64;

/// Logical request category, used for status reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    ListRecords,
    FetchRecord,
    SearchRecords,
    AddRecord,
    UpdateRecord,
    DeleteRecord,
    Predict,
    FetchSummary,
    FetchPlots,
    FetchTrends,
    FetchDepartmentStats,
    FetchRootCauseStats,
    ExportCsv,
    FetchCatalog,
    Health,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::ListRecords => "list_records",
            RequestKind::FetchRecord => "fetch_record",
            RequestKind::SearchRecords => "search_records",
            RequestKind::AddRecord => "add_record",
            RequestKind::UpdateRecord => "update_record",
            RequestKind::DeleteRecord => "delete_record",
            RequestKind::Predict => "predict",
            RequestKind::FetchSummary => "fetch_summary",
            RequestKind::FetchPlots => "fetch_plots",
            RequestKind::FetchTrends => "fetch_trends",
            RequestKind::FetchDepartmentStats => "fetch_department_stats",
            RequestKind::FetchRootCauseStats => "fetch_root_cause_stats",
            RequestKind::ExportCsv => "export_csv",
            RequestKind::FetchCatalog => "fetch_catalog",
            RequestKind::Health => "health",
        };
        write!(f, "{}", name)
    }
}

/// Request state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    InFlight,
    Succeeded,
    /// Failed with a user-visible reason
    Failed(String),
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Succeeded | RequestState::Failed(_))
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_advance_to(&self, next: &RequestState) -> bool {
        matches!(
            (self, next),
            (RequestState::Idle, RequestState::InFlight)
                | (RequestState::InFlight, RequestState::Succeeded)
                | (RequestState::InFlight, RequestState::Failed(_))
        )
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Idle => write!(f, "IDLE"),
            RequestState::InFlight => write!(f, "IN_FLIGHT"),
            RequestState::Succeeded => write!(f, "SUCCEEDED"),
            RequestState::Failed(reason) => write!(f, "FAILED ({})", reason),
        }
    }
}

/// Unique id of one logical request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Published whenever a request starts or completes
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEvent {
    pub id: RequestId,
    pub kind: RequestKind,
    pub state: RequestState,
}

#[derive(Debug)]
struct InFlightRequest {
    kind: RequestKind,
    started: Instant,
}

/// Coordinator for all remote calls
pub struct SyncCoordinator {
    transport: Arc<dyn Transport>,
    in_flight: DashMap<RequestId, InFlightRequest>,
    last_outcome: DashMap<RequestKind, RequestState>,
    events: broadcast::Sender<SyncEvent>,
}

impl fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl SyncCoordinator {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            in_flight: DashMap::new(),
            last_outcome: DashMap::new(),
            events,
        }
    }

    /// Subscribe to request start/completion notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Current status for a request kind
    pub fn status(&self, kind: RequestKind) -> RequestState {
        if self.in_flight.iter().any(|entry| entry.value().kind == kind) {
            return RequestState::InFlight;
        }
        self.last_outcome
            .get(&kind)
            .map(|state| state.value().clone())
            .unwrap_or(RequestState::Idle)
    }

    /// Whether any request is awaiting a response
    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Send a request and decode a JSON body into `T`
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        kind: RequestKind,
        request: HttpRequest,
    ) -> Result<T, TransportError> {
        self.run(kind, request, decode_json).await
    }

    /// Send a request and return the body as text (e.g. a CSV download)
    pub async fn fetch_text(
        &self,
        kind: RequestKind,
        request: HttpRequest,
    ) -> Result<String, TransportError> {
        self.run(kind, request, |body| Ok(body.to_string())).await
    }

    /// Send a request whose body carries nothing but status
    pub async fn execute(
        &self,
        kind: RequestKind,
        request: HttpRequest,
    ) -> Result<(), TransportError> {
        self.run(kind, request, |_| Ok(())).await
    }

    async fn run<T, F>(
        &self,
        kind: RequestKind,
        request: HttpRequest,
        decode: F,
    ) -> Result<T, TransportError>
    where
        F: FnOnce(&str) -> Result<T, TransportError>,
    {
        let id = self.begin(kind);
        debug!(request = %id, kind = %kind, "{} {}", request.method, request.route());

        let result = match self.transport.send(&request).await {
            Ok(response) if response.is_success() => decode(&response.body),
            Ok(response) => Err(TransportError::from_status(response.status, &response.body)),
            Err(err) => Err(err),
        };

        self.finish(id, kind, result.as_ref().err());
        result
    }

    fn begin(&self, kind: RequestKind) -> RequestId {
        let id = RequestId::new();
        self.in_flight.insert(
            id,
            InFlightRequest {
                kind,
                started: Instant::now(),
            },
        );
        self.publish(id, kind, RequestState::InFlight);
        id
    }

    fn finish(&self, id: RequestId, kind: RequestKind, error: Option<&TransportError>) {
        let elapsed = self
            .in_flight
            .remove(&id)
            .map(|(_, req)| req.started.elapsed());

        let state = match error {
            None => {
                debug!(request = %id, kind = %kind, ?elapsed, "request succeeded");
                RequestState::Succeeded
            }
            Some(err) => {
                warn!(request = %id, kind = %kind, ?elapsed, "request failed: {}", err);
                RequestState::Failed(err.to_string())
            }
        };

        self.last_outcome.insert(kind, state.clone());
        self.publish(id, kind, state);
    }

    fn publish(&self, id: RequestId, kind: RequestKind, state: RequestState) {
        // No subscribers is fine
        let _ = self.events.send(SyncEvent { id, kind, state });
    }
}

/// Decode a JSON body, treating `{"error": "..."}` as a service-reported failure
fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, TransportError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if let Some(message) = value
        .as_object()
        .filter(|map| map.len() <= 2)
        .and_then(|map| map.get("error"))
        .and_then(|err| err.as_str())
    {
        return Err(TransportError::Service(message.to_string()));
    }
    Ok(serde_json::from_value(value)?)
}
