//! HTTP discovery documents served next to the DevTools WebSocket.

use std::time::Duration;

use cdp_attach_protocol::{TargetDescriptor, VersionInfo};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Result};
use crate::options::ConnectOptions;

/// Per-request ceiling for discovery documents.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for `/json/list` and `/json/version`.
#[derive(Debug, Clone)]
pub struct DevtoolsHttp {
	client: reqwest::Client,
}

impl DevtoolsHttp {
	pub fn new() -> Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(HTTP_TIMEOUT)
			.no_proxy()
			.build()
			.map_err(|e| Error::Http(format!("Failed to create HTTP client: {e}")))?;
		Ok(Self { client })
	}

	/// Every target the endpoint currently exposes.
	pub async fn list_targets(&self, options: &ConnectOptions) -> Result<Vec<TargetDescriptor>> {
		let targets: Vec<TargetDescriptor> = self.get_json(options, "/json/list").await?;
		debug!(port = options.port, count = targets.len(), "listed targets");
		Ok(targets)
	}

	/// Browser metadata, including the browser-level WebSocket URL.
	pub async fn version(&self, options: &ConnectOptions) -> Result<VersionInfo> {
		self.get_json(options, "/json/version").await
	}

	async fn get_json<T: DeserializeOwned>(&self, options: &ConnectOptions, path: &str) -> Result<T> {
		let url = options.http_url(path);
		let response = self.client.get(&url).send().await?;

		if !response.status().is_success() {
			return Err(Error::Http(format!("unexpected status {} from {url}", response.status())));
		}

		response
			.json()
			.await
			.map_err(|e| Error::Http(format!("Failed to parse response from {url}: {e}")))
	}
}
