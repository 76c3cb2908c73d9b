//! JSON framing of the remote-debugging protocol.
//!
//! Every WebSocket text frame carries one JSON object: a [`Request`] from the
//! client, or a [`Response`] / [`Event`] from the endpoint. Incoming frames are
//! decoded through the untagged [`Message`] union.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Enables or disables `Target.targetCreated` / `Target.targetInfoChanged` notifications.
pub const SET_DISCOVER_TARGETS: &str = "Target.setDiscoverTargets";

/// Emitted when a new target is created.
pub const TARGET_CREATED: &str = "Target.targetCreated";

/// Emitted when an existing target's info (title, url) changes.
pub const TARGET_INFO_CHANGED: &str = "Target.targetInfoChanged";

/// Command sent to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
	pub id: u64,
	pub method: String,
	pub params: Value,
}

/// Reply to a [`Request`], correlated by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
	pub id: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ResponseError>,
}

/// Error object of a failed [`Response`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<String>,
}

/// Notification pushed by the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
	pub method: String,
	#[serde(default)]
	pub params: Value,
	/// Set when the event belongs to a flattened child session.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Discriminated union of incoming frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Has an `id` field.
	Response(Response),
	/// Has a `method` field and no `id`.
	Event(Event),
	/// Forward-compatible catch-all.
	Unknown(Value),
}

/// Params of [`SET_DISCOVER_TARGETS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDiscoverTargetsParams {
	pub discover: bool,
}
