//! Wire types for DevTools target discovery.
//!
//! This crate contains the serde-serializable shapes exchanged with a
//! remote-debugging endpoint: the HTTP discovery documents (`/json/list`,
//! `/json/version`), the `Target.*` lifecycle notifications, and the JSON
//! command/response/event framing spoken over the WebSocket.
//!
//! Types in this crate are pure data. Connection handling, retries and the
//! discovery race live in `cdp-attach-runtime`.

pub mod message;
pub mod target;

pub use message::*;
pub use target::*;
