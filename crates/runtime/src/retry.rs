//! Waiting for a debug port to accept TCP connections.
//!
//! The browser process starts asynchronously, so its debug listener may not
//! be up when we first look. [`RetryingConnector`] dials the port until it
//! accepts, following the tiered table in [`delay_for_retry`]:
//!
//! | attempt | delay  |
//! |---------|--------|
//! | 0..10   | 100ms  |
//! | 10..18  | 500ms  |
//! | 18..33  | 1000ms |
//! | 33..    | give up |
//!
//! Once roughly five seconds have passed (attempt 18), every further failed
//! attempt is reported to the injected [`WarningSink`].

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::options::ConnectOptions;

/// First attempt index reported through [`WarningSink`].
pub const WARN_FROM_ATTEMPT: u32 = 18;

/// First attempt index with no retry left.
pub const RETRY_LIMIT: u32 = 33;

/// Delay to wait after failed attempt `attempt`, or `None` to stop retrying.
pub fn delay_for_retry(attempt: u32) -> Option<Duration> {
	let ms = match attempt {
		0..10 => 100,
		10..WARN_FROM_ATTEMPT => 500,
		WARN_FROM_ATTEMPT..RETRY_LIMIT => 1000,
		_ => return None,
	};
	Some(Duration::from_millis(ms))
}

/// Whether a failure at `attempt` is surfaced as [`Warning::RetryingConnection`].
pub fn warns_at(attempt: u32) -> bool {
	(WARN_FROM_ATTEMPT..RETRY_LIMIT).contains(&attempt)
}

/// Non-fatal notice raised while waiting on a slow endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
	RetryingConnection { port: u16, attempt: u32 },
}

impl Warning {
	/// Stable identifier for log and telemetry consumers.
	pub fn code(&self) -> &'static str {
		match self {
			Warning::RetryingConnection { .. } => "CDP_RETRYING_CONNECTION",
		}
	}
}

impl fmt::Display for Warning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Warning::RetryingConnection { port, attempt } => write!(
				f,
				"Still waiting to connect to the DevTools protocol on port {port}, retrying in 1 second (attempt {}/{RETRY_LIMIT})",
				attempt + 1
			),
		}
	}
}

/// Observer for [`Warning`]s.
pub trait WarningSink: Send + Sync {
	fn warn(&self, warning: &Warning);
}

impl<T: WarningSink + ?Sized> WarningSink for Arc<T> {
	fn warn(&self, warning: &Warning) {
		(**self).warn(warning)
	}
}

impl<T: WarningSink + ?Sized> WarningSink for &T {
	fn warn(&self, warning: &Warning) {
		(**self).warn(warning)
	}
}

/// Forwards warnings to `tracing` at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWarnings;

impl WarningSink for TracingWarnings {
	fn warn(&self, warning: &Warning) {
		match warning {
			Warning::RetryingConnection { port, attempt } => {
				tracing::warn!(code = warning.code(), port, attempt, "{warning}");
			}
		}
	}
}

/// Proves that a port accepts connections.
#[async_trait]
pub trait Dialer: Send + Sync {
	async fn dial(&self, options: &ConnectOptions) -> io::Result<()>;
}

#[async_trait]
impl<T: Dialer + ?Sized> Dialer for &T {
	async fn dial(&self, options: &ConnectOptions) -> io::Result<()> {
		(**self).dial(options).await
	}
}

/// Opens a TCP connection and shuts it down right away.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
	async fn dial(&self, options: &ConnectOptions) -> io::Result<()> {
		let mut stream = TcpStream::connect((options.host.as_str(), options.port)).await?;
		// only needed to test the connection
		if let Err(e) = stream.shutdown().await {
			trace!(port = options.port, error = %e, "shutting down reachability check failed");
		}
		Ok(())
	}
}

/// Dials until the endpoint accepts or the retry table runs out.
pub struct RetryingConnector<D, W> {
	dialer: D,
	warnings: W,
}

impl<D: Dialer, W: WarningSink> RetryingConnector<D, W> {
	pub fn new(dialer: D, warnings: W) -> Self {
		Self { dialer, warnings }
	}

	/// Resolves once `options` accepts a TCP connection.
	///
	/// # Errors
	///
	/// [`Error::ConnectionFailed`] with the last attempt's error once
	/// [`delay_for_retry`] returns `None`.
	pub async fn connect(&self, options: &ConnectOptions) -> Result<()> {
		let mut attempt = 0;
		loop {
			let err = match self.dialer.dial(options).await {
				Ok(()) => {
					debug!(port = options.port, attempts = attempt + 1, "debug port accepted connection");
					return Ok(());
				}
				Err(err) => err,
			};

			let Some(delay) = delay_for_retry(attempt) else {
				debug!(port = options.port, attempt, error = %err, "giving up on debug port");
				return Err(Error::ConnectionFailed {
					port: options.port,
					source: err,
				});
			};

			if warns_at(attempt) {
				self.warnings.warn(&Warning::RetryingConnection {
					port: options.port,
					attempt,
				});
			}

			debug!(
				port = options.port,
				attempt,
				delay_ms = delay.as_millis() as u64,
				error = %err,
				"connection attempt failed, retrying"
			);
			tokio::time::sleep(delay).await;
			attempt += 1;
		}
	}
}
