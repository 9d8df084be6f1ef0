//! Remote synchronization layer
//!
//! - `transport_*`: HTTP plumbing behind the [`Transport`] trait
//! - `coordinator`: per-request lifecycle, failure classification, notifications
//! - `scope`: discards results that arrive after their owner went away

pub mod coordinator;
pub mod scope;
pub mod transport_fake;
pub mod transport_http;
pub mod transport_types;

pub use coordinator::{RequestId, RequestKind, RequestState, SyncCoordinator, SyncEvent};
pub use scope::ViewScope;
pub use transport_fake::{FakeReply, FakeTransport};
pub use transport_http::HttpTransport;
pub use transport_types::{HttpRequest, HttpResponse, Method, Transport, TransportError};
