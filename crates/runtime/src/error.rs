//! Error types for the attach runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while waiting for a debug port or resolving a target.
#[derive(Debug, Error)]
pub enum Error {
	/// The requested port is not a usable TCP port number.
	#[error("Invalid port {0}: expected a TCP port number between 1 and 65535")]
	InvalidPort(u32),

	/// The debug port never accepted a connection within the retry ceiling.
	#[error("Could not connect to the DevTools protocol on port {port}: {source}")]
	ConnectionFailed {
		port: u16,
		/// Error of the last connection attempt.
		#[source]
		source: std::io::Error,
	},

	/// No target matched the filter, neither listed nor announced in time.
	#[error("Could not find a {target_type} target at {url} on port {port}")]
	TargetNotFound { port: u16, target_type: String, url: String },

	/// HTTP discovery request failed (`/json/list`, `/json/version`).
	#[error("HTTP error: {0}")]
	Http(String),

	/// WebSocket-level failure.
	#[error("Transport error: {0}")]
	Transport(String),

	/// The endpoint answered a command with an error object.
	#[error("Remote error {code}: {message}")]
	Remote { code: i64, message: String },

	/// The session went away while a request was pending.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if this error ended the port readiness wait.
	pub fn is_connection_failed(&self) -> bool {
		matches!(self, Error::ConnectionFailed { .. })
	}

	/// Returns true if this error ended target discovery without a match.
	pub fn is_target_not_found(&self) -> bool {
		matches!(self, Error::TargetNotFound { .. })
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Error::Http(err.to_string())
	}
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
	fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
		Error::Transport(err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use std::io;

	use super::*;

	#[test]
	fn connection_failed_keeps_port_and_source() {
		let err = Error::ConnectionFailed {
			port: 9222,
			source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
		};

		assert!(err.is_connection_failed());
		let msg = err.to_string();
		assert!(msg.contains("9222"), "{msg}");
		assert!(msg.contains("connection refused"), "{msg}");

		let source = std::error::Error::source(&err).expect("source preserved");
		assert_eq!(source.to_string(), "connection refused");
	}

	#[test]
	fn target_not_found_describes_filter() {
		let err = Error::TargetNotFound {
			port: 9222,
			target_type: "page".into(),
			url: "about:blank".into(),
		};

		assert!(err.is_target_not_found());
		assert_eq!(err.to_string(), "Could not find a page target at about:blank on port 9222");
	}

	#[test]
	fn invalid_port_message() {
		assert!(Error::InvalidPort(70000).to_string().contains("70000"));
	}
}
