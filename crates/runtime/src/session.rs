//! Protocol session over a [`Transport`].
//!
//! This module implements request/response correlation and event fan-out on
//! top of the transport:
//! - Generating unique request IDs
//! - Correlating responses with pending requests
//! - Routing events to the listeners subscribed to their method
//!
//! # Message Flow
//!
//! 1. Caller invokes [`CdpSession::send_command`] with a method and params
//! 2. Session allocates an ID and parks a oneshot sender under it
//! 3. The request is queued for the writer task
//! 4. The dispatch task receives the response from the transport
//! 5. The response is matched by ID and delivered through the oneshot
//!
//! Dropping the session stops its background tasks; pending requests and
//! event listeners then observe a closed channel.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use cdp_attach_protocol::{Event, Message, Request};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver, WebSocketTransport};


/// Pending request callbacks keyed by request ID.
type CallbackMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;

/// Event listeners, each interested in a set of methods.
type ListenerList = Arc<Mutex<Vec<Listener>>>;

struct Listener {
	methods: Vec<String>,
	tx: mpsc::UnboundedSender<Event>,
}

impl Listener {
	fn wants(&self, method: &str) -> bool {
		self.methods.iter().any(|m| m == method)
	}
}

enum Outbound {
	Message(Value),
	Close,
}

/// Removes the pending callback when a request future is dropped unanswered.
struct CancelGuard {
	id: u64,
	callbacks: CallbackMap,
	completed: bool,
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if !self.completed && self.callbacks.lock().remove(&self.id).is_some() {
			debug!(id = self.id, "removed abandoned request callback");
		}
	}
}

/// Future returned by [`CdpSession::send_command`].
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.completed = true;
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

struct SessionTasks {
	reader: JoinHandle<()>,
	writer: JoinHandle<Result<()>>,
	dispatcher: JoinHandle<()>,
}

/// A live protocol connection to one endpoint.
pub struct CdpSession {
	last_id: AtomicU64,
	callbacks: CallbackMap,
	listeners: ListenerList,
	outbound_tx: mpsc::UnboundedSender<Outbound>,
	tasks: Option<SessionTasks>,
}

impl CdpSession {
	/// Connect to a WebSocket debugger URL and start the session.
	pub async fn connect(ws_url: &str) -> Result<Self> {
		let parts = WebSocketTransport::connect(ws_url).await?;
		Ok(Self::start(parts))
	}

	/// Start reader, writer and dispatch tasks over `parts`.
	///
	/// Must be called from within a tokio runtime.
	pub fn start(parts: TransportParts) -> Self {
		let TransportParts {
			sender,
			receiver,
			message_rx,
		} = parts;

		let callbacks: CallbackMap = Arc::new(Mutex::new(HashMap::new()));
		let listeners: ListenerList = Arc::new(Mutex::new(Vec::new()));
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

		let tasks = SessionTasks {
			reader: tokio::spawn(read_loop(receiver)),
			writer: tokio::spawn(write_loop(sender, outbound_rx)),
			dispatcher: tokio::spawn(dispatch_loop(message_rx, Arc::clone(&callbacks), Arc::clone(&listeners))),
		};

		Self {
			last_id: AtomicU64::new(0),
			callbacks,
			listeners,
			outbound_tx,
			tasks: Some(tasks),
		}
	}

	/// Send a command and await its result.
	pub async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
		debug!(id, method, "sending command");

		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().insert(id, tx);
		let guard = CancelGuard {
			id,
			callbacks: Arc::clone(&self.callbacks),
			completed: false,
		};

		let request = Request {
			id,
			method: method.to_string(),
			params,
		};
		let request_value = serde_json::to_value(&request)?;

		if self.outbound_tx.send(Outbound::Message(request_value)).is_err() {
			error!(id, method, "failed to queue command: session closed");
			return Err(Error::ChannelClosed);
		}

		ResponseFuture { rx, guard }.await
	}

	/// Receive every event whose method is in `methods`.
	///
	/// The receiver yields `None` once the session ends.
	pub fn subscribe(&self, methods: &[&str]) -> mpsc::UnboundedReceiver<Event> {
		let (tx, rx) = mpsc::unbounded_channel();
		self.listeners.lock().push(Listener {
			methods: methods.iter().map(|m| m.to_string()).collect(),
			tx,
		});
		rx
	}

	/// Send a close frame and stop the background tasks.
	pub async fn close(mut self) -> Result<()> {
		let Some(tasks) = self.tasks.take() else {
			return Ok(());
		};

		// Fails only if the writer already exited; its result is reported below.
		let _ = self.outbound_tx.send(Outbound::Close);
		let written = tasks.writer.await;

		tasks.reader.abort();
		tasks.dispatcher.abort();
		fail_pending(&self.callbacks, &self.listeners);

		match written {
			Ok(result) => result,
			Err(e) => Err(Error::Transport(format!("writer task failed: {e}"))),
		}
	}
}

impl Drop for CdpSession {
	fn drop(&mut self) {
		if let Some(tasks) = self.tasks.take() {
			tasks.reader.abort();
			tasks.writer.abort();
			tasks.dispatcher.abort();
		}
	}
}

async fn read_loop(mut receiver: Box<dyn TransportReceiver>) {
	if let Err(e) = receiver.run().await {
		error!(error = %e, "transport read error");
	}
}

async fn write_loop(mut sender: Box<dyn Transport>, mut outbound_rx: mpsc::UnboundedReceiver<Outbound>) -> Result<()> {
	while let Some(outbound) = outbound_rx.recv().await {
		match outbound {
			Outbound::Message(message) => {
				if let Err(e) = sender.send(message).await {
					error!(error = %e, "transport write error");
					return Err(e);
				}
			}
			Outbound::Close => return sender.close().await,
		}
	}
	Ok(())
}

async fn dispatch_loop(mut message_rx: mpsc::UnboundedReceiver<Value>, callbacks: CallbackMap, listeners: ListenerList) {
	while let Some(value) = message_rx.recv().await {
		match serde_json::from_value::<Message>(value) {
			Ok(message) => dispatch(message, &callbacks, &listeners),
			Err(e) => error!(error = %e, "failed to parse message"),
		}
	}
	debug!("transport closed, failing pending requests");
	fail_pending(&callbacks, &listeners);
}

fn dispatch(message: Message, callbacks: &CallbackMap, listeners: &ListenerList) {
	match message {
		Message::Response(response) => {
			let Some(callback) = callbacks.lock().remove(&response.id) else {
				debug!(id = response.id, "response for unknown request (ignored)");
				return;
			};

			let result = match response.error {
				Some(error) => Err(Error::Remote {
					code: error.code,
					message: error.message,
				}),
				None => Ok(response.result.unwrap_or(Value::Null)),
			};
			let _ = callback.send(result);
		}
		Message::Event(event) => {
			let mut listeners = listeners.lock();
			listeners.retain(|listener| !listener.tx.is_closed());
			for listener in listeners.iter().filter(|l| l.wants(&event.method)) {
				let _ = listener.tx.send(event.clone());
			}
		}
		Message::Unknown(value) => {
			debug!(%value, "unknown message type (ignored)");
		}
	}
}

/// Drops every pending callback and listener so their receivers observe closure.
fn fail_pending(callbacks: &CallbackMap, listeners: &ListenerList) {
	callbacks.lock().clear();
	listeners.lock().clear();
}
