//! Resolving the WebSocket URL of a freshly created target.
//!
//! Discovery runs at most once per call:
//!
//! 1. List the endpoint's targets; a match ends discovery right away.
//! 2. Otherwise open a dedicated discovery session and enable target
//!    notifications on it.
//! 3. Race session setup and the first matching `Target.targetCreated` /
//!    `Target.targetInfoChanged` notification against a
//!    [`DISCOVERY_TIMEOUT`] timer started before the session was opened.
//!    When the timer wins, the targets are listed once more.
//! 4. Close the discovery session, if one was opened, whichever side won.

use std::time::Duration;

use async_trait::async_trait;
use cdp_attach_protocol::{
	Event, SET_DISCOVER_TARGETS, SetDiscoverTargetsParams, TARGET_CREATED, TARGET_INFO_CHANGED, TargetDescriptor,
	TargetEventParams, TargetFilter, TargetInfo, page_ws_url,
};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::http::DevtoolsHttp;
use crate::options::ConnectOptions;
use crate::session::CdpSession;


/// How long to wait for a matching notification before listing targets again.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_millis(15_000);

/// The endpoint-facing operations discovery needs.
#[async_trait]
pub trait DevtoolsEndpoint: Send + Sync {
	/// Every target currently exposed by the endpoint.
	async fn list_targets(&self, options: &ConnectOptions) -> Result<Vec<TargetDescriptor>>;

	/// Open a session used only to watch target lifecycle notifications.
	async fn open_session(&self, options: &ConnectOptions) -> Result<Box<dyn DiscoverySession>>;
}

#[async_trait]
impl<T: DevtoolsEndpoint + ?Sized> DevtoolsEndpoint for &T {
	async fn list_targets(&self, options: &ConnectOptions) -> Result<Vec<TargetDescriptor>> {
		(**self).list_targets(options).await
	}

	async fn open_session(&self, options: &ConnectOptions) -> Result<Box<dyn DiscoverySession>> {
		(**self).open_session(options).await
	}
}

/// A session delivering target lifecycle notifications.
#[async_trait]
pub trait DiscoverySession: Send {
	/// Ask the endpoint to report target creation and changes.
	async fn enable_target_discovery(&mut self) -> Result<()>;

	/// Payload of the next `Target.targetCreated` or `Target.targetInfoChanged`
	/// notification, or `None` once the session has ended.
	async fn next_target_event(&mut self) -> Option<TargetInfo>;

	async fn close(self: Box<Self>) -> Result<()>;
}

/// Resolves the WebSocket URL of the target matching a [`TargetFilter`].
pub struct TargetDiscoverer<E> {
	endpoint: E,
}

impl<E: DevtoolsEndpoint> TargetDiscoverer<E> {
	pub fn new(endpoint: E) -> Self {
		Self { endpoint }
	}

	pub fn endpoint(&self) -> &E {
		&self.endpoint
	}

	/// WebSocket debugger URL of the first target matching `filter`.
	///
	/// [`DISCOVERY_TIMEOUT`] starts before the discovery session is opened, so
	/// opening it and enabling notifications count against the same window.
	///
	/// # Errors
	///
	/// [`Error::TargetNotFound`] when neither a notification nor the fallback
	/// listing produced a match. Endpoint failures are propagated as is.
	pub async fn resolve(&self, options: &ConnectOptions, filter: &TargetFilter) -> Result<String> {
		if let Some(target) = self.find_listed(options, filter).await? {
			debug!(id = %target.id, "found listed target");
			return Ok(listed_ws_url(&target, options));
		}

		debug!(?filter, "waiting for target to be created");
		let deadline = tokio::time::sleep(DISCOVERY_TIMEOUT);
		tokio::pin!(deadline);

		let opened = tokio::select! {
			opened = self.endpoint.open_session(options) => Some(opened?),
			() = &mut deadline => None,
		};

		let announced = match opened {
			Some(mut session) => {
				let outcome = tokio::select! {
					announced = announce(session.as_mut(), filter) => announced.map(Some),
					() = &mut deadline => Ok(None),
				};
				if let Err(err) = session.close().await {
					warn!(error = %err, "failed to close discovery session");
				}
				outcome?
			}
			None => None,
		};

		let url = match announced {
			Some(info) => {
				debug!(target_id = %info.target_id, "matching target announced");
				Some(page_ws_url(&options.host, options.port, &info.target_id))
			}
			None => {
				debug!(?filter, "timed out waiting for target created/changed event, searching all targets");
				self.find_listed(options, filter)
					.await?
					.map(|target| listed_ws_url(&target, options))
			}
		};

		url.ok_or_else(|| Error::TargetNotFound {
			port: options.port,
			target_type: filter.target_type.clone(),
			url: filter.url.clone(),
		})
	}

	async fn find_listed(&self, options: &ConnectOptions, filter: &TargetFilter) -> Result<Option<TargetDescriptor>> {
		let targets = self.endpoint.list_targets(options).await?;
		Ok(filter.find_in(&targets).cloned())
	}
}

/// Enables notifications, then waits for a matching announcement.
async fn announce(session: &mut dyn DiscoverySession, filter: &TargetFilter) -> Result<TargetInfo> {
	debug!("enabling target discovery");
	session.enable_target_discovery().await?;
	Ok(wait_for_announcement(session, filter).await)
}

/// First announced target matching `filter`. Never resolves if the session
/// ends first, leaving the decision to the timer path.
async fn wait_for_announcement(session: &mut dyn DiscoverySession, filter: &TargetFilter) -> TargetInfo {
	while let Some(info) = session.next_target_event().await {
		if filter.matches(&info) {
			return info;
		}
		trace!(target_id = %info.target_id, url = %info.url, "ignoring non-matching target");
	}
	debug!("discovery session ended before a matching target was announced");
	std::future::pending().await
}

/// The listed URL as supplied, or one built from the target id when the
/// endpoint omitted it (another client is attached).
fn listed_ws_url(target: &TargetDescriptor, options: &ConnectOptions) -> String {
	match &target.web_socket_debugger_url {
		Some(url) => url.clone(),
		None => page_ws_url(&options.host, options.port, &target.id),
	}
}

/// Chromium-style endpoint: `/json/*` over HTTP plus a browser-level WebSocket.
#[derive(Debug, Clone)]
pub struct ChromeEndpoint {
	http: DevtoolsHttp,
}

impl ChromeEndpoint {
	pub fn new() -> Result<Self> {
		Ok(Self {
			http: DevtoolsHttp::new()?,
		})
	}
}

#[async_trait]
impl DevtoolsEndpoint for ChromeEndpoint {
	async fn list_targets(&self, options: &ConnectOptions) -> Result<Vec<TargetDescriptor>> {
		self.http.list_targets(options).await
	}

	async fn open_session(&self, options: &ConnectOptions) -> Result<Box<dyn DiscoverySession>> {
		let version = self.http.version(options).await?;
		debug!(url = %version.web_socket_debugger_url, "connecting discovery session");
		let session = CdpDiscoverySession::open(&version.web_socket_debugger_url).await?;
		Ok(Box::new(session))
	}
}

/// [`DiscoverySession`] over a [`CdpSession`].
pub struct CdpDiscoverySession {
	session: CdpSession,
	events: mpsc::UnboundedReceiver<Event>,
}

impl CdpDiscoverySession {
	/// Connect to `ws_url` and subscribe to target notifications.
	pub async fn open(ws_url: &str) -> Result<Self> {
		Ok(Self::from_session(CdpSession::connect(ws_url).await?))
	}

	/// Subscribes before discovery is enabled so no notification is missed.
	pub fn from_session(session: CdpSession) -> Self {
		let events = session.subscribe(&[TARGET_CREATED, TARGET_INFO_CHANGED]);
		Self { session, events }
	}
}

#[async_trait]
impl DiscoverySession for CdpDiscoverySession {
	async fn enable_target_discovery(&mut self) -> Result<()> {
		let params = serde_json::to_value(SetDiscoverTargetsParams { discover: true })?;
		self.session.send_command(SET_DISCOVER_TARGETS, params).await?;
		Ok(())
	}

	async fn next_target_event(&mut self) -> Option<TargetInfo> {
		while let Some(event) = self.events.recv().await {
			match serde_json::from_value::<TargetEventParams>(event.params) {
				Ok(params) => return Some(params.target_info),
				Err(e) => debug!(method = %event.method, error = %e, "ignoring malformed target event"),
			}
		}
		None
	}

	async fn close(self: Box<Self>) -> Result<()> {
		debug!("closing discovery session");
		self.session.close().await
	}
}
