//! Attach runtime - port readiness and target discovery for DevTools endpoints
//!
//! This crate turns a remote-debugging port number into the WebSocket URL of
//! a freshly created, not yet navigated tab:
//!
//! - **Retry**: Dial the port on a tiered backoff until the listener is up
//! - **Discovery**: List targets, or race target notifications against a timer
//! - **Session**: Request/response correlation and event fan-out over a WebSocket
//! - **Attach**: Validate the port and sequence the steps above
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ Attacher::ws_target_for      │
//! └──────┬───────────────┬───────┘
//!        │               │
//! ┌──────▼──────┐ ┌──────▼───────────┐
//! │ Retrying    │ │ TargetDiscoverer │
//! │ Connector   │ │  list ─┐         │
//! │ (Dialer)    │ │  race: events    │
//! └─────────────┘ │        vs timer  │
//!                 └──────┬───────────┘
//!                        │ DevtoolsEndpoint
//!                 ┌──────▼──────┐
//!                 │ HTTP /json  │
//!                 │ CdpSession  │
//!                 │ Transport   │
//!                 └─────────────┘
//! ```
//!
//! The dialer, the endpoint and the warning observer are traits so the state
//! machines can be driven without a browser.

pub mod attach;
pub mod discovery;
pub mod error;
pub mod http;
pub mod options;
pub mod retry;
pub mod session;
pub mod transport;

pub use attach::{Attacher, get_ws_target_for, validate_port};
pub use discovery::{
	CdpDiscoverySession, ChromeEndpoint, DISCOVERY_TIMEOUT, DevtoolsEndpoint, DiscoverySession, TargetDiscoverer,
};
pub use error::{Error, Result};
pub use http::DevtoolsHttp;
pub use options::{ConnectOptions, LOOPBACK_HOST};
pub use retry::{
	Dialer, RETRY_LIMIT, RetryingConnector, TcpDialer, TracingWarnings, WARN_FROM_ATTEMPT, Warning, WarningSink,
	delay_for_retry, warns_at,
};
pub use session::CdpSession;
pub use transport::{
	Transport, TransportParts, TransportReceiver, WebSocketTransport, WebSocketTransportReceiver,
	WebSocketTransportSender,
};
