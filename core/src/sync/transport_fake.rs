//! Fake transport for testing
//!
//! Replays scripted replies per route instead of making HTTP calls.

use crate::sync::transport_types::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// Scripted reply
#[derive(Debug, Clone)]
pub enum FakeReply {
    Respond(HttpResponse),
    Fail(String),
}

/// Fake transport for testing (uses fixture strings)
///
/// Replies queue per `METHOD /route`. The last queued reply for a route repeats;
/// unscripted routes answer 404.
#[derive(Debug, Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, VecDeque<FakeReply>>>,
    calls: Mutex<Vec<HttpRequest>>,
}

fn route_key(method: Method, route: &str) -> String {
    format!("{} {}", method, route)
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a route
    pub fn respond(self, method: Method, route: &str, status: u16, body: &str) -> Self {
        self.push(method, route, FakeReply::Respond(HttpResponse::new(status, body)));
        self
    }

    /// Queue a network error for a route
    pub fn fail(self, method: Method, route: &str, msg: &str) -> Self {
        self.push(method, route, FakeReply::Fail(msg.to_string()));
        self
    }

    /// Queue a reply on a shared transport
    pub fn push(&self, method: Method, route: &str, reply: FakeReply) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(route_key(method, route))
            .or_default()
            .push_back(reply);
    }

    /// Drop every queued reply for a route and queue `reply` instead
    pub fn replace(&self, method: Method, route: &str, reply: FakeReply) {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = routes.entry(route_key(method, route)).or_default();
        queue.clear();
        queue.push_back(reply);
    }

    /// Requests received so far, in order
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn next_reply(&self, request: &HttpRequest) -> Option<FakeReply> {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = routes.get_mut(&route_key(request.method, &request.route()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        match self.next_reply(request) {
            Some(FakeReply::Respond(response)) => Ok(response),
            Some(FakeReply::Fail(msg)) => Err(TransportError::Network(msg)),
            None => Ok(HttpResponse::new(404, r#"{"detail":"Not Found"}"#)),
        }
    }
}
