//! Entry point: from a debug port number to a page WebSocket URL.

use cdp_attach_protocol::{TargetDescriptor, TargetFilter};
use tracing::debug;

use crate::discovery::{ChromeEndpoint, DevtoolsEndpoint, TargetDiscoverer};
use crate::error::{Error, Result};
use crate::options::ConnectOptions;
use crate::retry::{Dialer, RetryingConnector, TcpDialer, TracingWarnings, WarningSink};

/// Checks that `port` is a usable TCP port number.
pub fn validate_port(port: u32) -> Result<u16> {
	match u16::try_from(port) {
		Ok(port) if port != 0 => Ok(port),
		_ => Err(Error::InvalidPort(port)),
	}
}

/// Waits for a debug port, then finds the new tab on it.
pub struct Attacher<D, E, W> {
	connector: RetryingConnector<D, W>,
	discoverer: TargetDiscoverer<E>,
}

impl Attacher<TcpDialer, ChromeEndpoint, TracingWarnings> {
	/// Real TCP, HTTP and WebSocket collaborators; warnings go to `tracing`.
	pub fn chrome() -> Result<Self> {
		Ok(Self::new(TcpDialer, ChromeEndpoint::new()?, TracingWarnings))
	}
}

impl<D: Dialer, E: DevtoolsEndpoint, W: WarningSink> Attacher<D, E, W> {
	pub fn new(dialer: D, endpoint: E, warnings: W) -> Self {
		Self {
			connector: RetryingConnector::new(dialer, warnings),
			discoverer: TargetDiscoverer::new(endpoint),
		}
	}

	/// WebSocket debugger URL of the blank page target on `port`.
	///
	/// # Errors
	///
	/// - [`Error::InvalidPort`] before anything is attempted
	/// - [`Error::ConnectionFailed`] if the port never accepted a connection
	/// - [`Error::TargetNotFound`] if no blank page showed up
	pub async fn ws_target_for(&self, port: u32) -> Result<String> {
		let options = self.wait_for_port(port).await?;
		let url = self.discoverer.resolve(&options, &TargetFilter::new_tab()).await?;
		debug!(%url, "found DevTools target");
		Ok(url)
	}

	/// Every target exposed on `port`, once the port accepts connections.
	pub async fn targets_for(&self, port: u32) -> Result<Vec<TargetDescriptor>> {
		let options = self.wait_for_port(port).await?;
		self.discoverer.endpoint().list_targets(&options).await
	}

	async fn wait_for_port(&self, port: u32) -> Result<ConnectOptions> {
		let port = validate_port(port)?;
		debug!(port, "getting WebSocket connection to DevTools");

		let options = ConnectOptions::loopback(port);
		self.connector
			.connect(&options)
			.await
			.inspect_err(|err| debug!(?options, error = %err, "failed to connect to DevTools"))?;
		Ok(options)
	}
}

/// [`Attacher::ws_target_for`] with the default collaborators.
pub async fn get_ws_target_for(port: u32) -> Result<String> {
	Attacher::chrome()?.ws_target_for(port).await
}

#[cfg(test)]
mod tests {
	use std::io;
	use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
	use std::time::Duration;

	use async_trait::async_trait;
	use tokio::time::Instant;

	use super::*;
	use crate::discovery::DiscoverySession;

	struct FlakyDialer {
		failures: u32,
		calls: AtomicU32,
	}

	#[async_trait]
	impl Dialer for FlakyDialer {
		async fn dial(&self, _options: &ConnectOptions) -> io::Result<()> {
			if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
				Err(io::ErrorKind::ConnectionRefused.into())
			} else {
				Ok(())
			}
		}
	}

	fn flaky(failures: u32) -> FlakyDialer {
		FlakyDialer {
			failures,
			calls: AtomicU32::new(0),
		}
	}

	struct ListingEndpoint {
		targets: Vec<TargetDescriptor>,
		list_calls: AtomicUsize,
	}

	#[async_trait]
	impl DevtoolsEndpoint for ListingEndpoint {
		async fn list_targets(&self, options: &ConnectOptions) -> Result<Vec<TargetDescriptor>> {
			assert_eq!(options.host, "127.0.0.1");
			self.list_calls.fetch_add(1, Ordering::SeqCst);
			Ok(self.targets.clone())
		}

		async fn open_session(&self, _options: &ConnectOptions) -> Result<Box<dyn DiscoverySession>> {
			panic!("a listed target must not open a discovery session")
		}
	}

	fn listing(targets: Vec<TargetDescriptor>) -> ListingEndpoint {
		ListingEndpoint {
			targets,
			list_calls: AtomicUsize::new(0),
		}
	}

	fn abc_page() -> TargetDescriptor {
		TargetDescriptor {
			id: "ABC".into(),
			target_type: "page".into(),
			url: "about:blank".into(),
			title: String::new(),
			web_socket_debugger_url: Some("ws://127.0.0.1:9222/devtools/page/ABC".into()),
			devtools_frontend_url: None,
			description: None,
		}
	}

	#[test]
	fn validate_port_accepts_tcp_range() {
		assert_eq!(validate_port(1).unwrap(), 1);
		assert_eq!(validate_port(9222).unwrap(), 9222);
		assert_eq!(validate_port(65535).unwrap(), 65535);
	}

	#[test]
	fn validate_port_rejects_out_of_range() {
		for port in [0, 65536, u32::MAX] {
			assert!(matches!(validate_port(port), Err(Error::InvalidPort(p)) if p == port));
		}
	}

	#[tokio::test(start_paused = true)]
	async fn resolves_listed_target_after_two_refusals() {
		let dialer = flaky(2);
		let endpoint = listing(vec![abc_page()]);
		let attacher = Attacher::new(&dialer, &endpoint, TracingWarnings);

		let start = Instant::now();
		let url = attacher.ws_target_for(9222).await.unwrap();

		assert_eq!(url, "ws://127.0.0.1:9222/devtools/page/ABC");
		assert_eq!(start.elapsed(), Duration::from_millis(200));
		assert_eq!(dialer.calls.load(Ordering::SeqCst), 3);
		assert_eq!(endpoint.list_calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn invalid_port_fails_before_dialing() {
		let dialer = flaky(0);
		let endpoint = listing(vec![abc_page()]);
		let attacher = Attacher::new(&dialer, &endpoint, TracingWarnings);

		let err = attacher.ws_target_for(70_000).await.unwrap_err();

		assert!(matches!(err, Error::InvalidPort(70_000)));
		assert_eq!(dialer.calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn connection_failure_skips_discovery() {
		let dialer = flaky(u32::MAX);
		let endpoint = listing(vec![abc_page()]);
		let attacher = Attacher::new(&dialer, &endpoint, TracingWarnings);

		let err = attacher.ws_target_for(9222).await.unwrap_err();

		assert!(err.is_connection_failed(), "got {err:?}");
		assert_eq!(endpoint.list_calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn targets_for_lists_everything() {
		let dialer = flaky(0);
		let mut other = abc_page();
		other.id = "XYZ".into();
		other.url = "https://example.com/".into();
		let endpoint = listing(vec![abc_page(), other]);
		let attacher = Attacher::new(&dialer, &endpoint, TracingWarnings);

		let targets = attacher.targets_for(9222).await.unwrap();

		assert_eq!(targets.len(), 2);
		assert_eq!(targets[1].id, "XYZ");
	}
}
