//! Where to reach the debug endpoint.

use serde::Serialize;

/// IPv4 loopback. `localhost` may resolve to `::1` first, which debug
/// listeners bound to IPv4 do not accept.
pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Address of a debug endpoint. Built once per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectOptions {
	pub host: String,
	pub port: u16,
}

impl ConnectOptions {
	/// Options for `port` on the IPv4 loopback interface.
	pub fn loopback(port: u16) -> Self {
		Self {
			host: LOOPBACK_HOST.to_string(),
			port,
		}
	}

	/// `http://host:port{path}`
	pub fn http_url(&self, path: &str) -> String {
		format!("http://{}:{}{}", self.host, self.port, path)
	}
}
