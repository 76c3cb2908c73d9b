//! WebSocket transport for protocol sessions.
//!
//! A transport is split in two halves so the session can write and read
//! concurrently: a [`Transport`] that serializes outgoing JSON into text frames,
//! and a [`TransportReceiver`] whose `run()` loop forwards every incoming JSON
//! frame to an unbounded channel until the socket closes.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::error::Result;


/// Outgoing half of a transport.
#[async_trait]
pub trait Transport: Send {
	/// Send one JSON message.
	async fn send(&mut self, message: Value) -> Result<()>;

	/// Start the closing handshake.
	async fn close(&mut self) -> Result<()>;
}

/// Incoming half of a transport.
#[async_trait]
pub trait TransportReceiver: Send {
	/// Forward incoming messages until the peer closes or the channel is dropped.
	async fn run(&mut self) -> Result<()>;
}

/// Both halves of a transport plus the channel `run()` feeds.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// Transport over a WebSocket carrying one JSON object per frame.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Open a client connection to `url` (`ws://host:port/devtools/...`).
	pub async fn connect(url: &str) -> Result<TransportParts> {
		debug!(url, "connecting WebSocket transport");
		let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
		Ok(Self::from_stream(stream))
	}

	/// Wrap an already established WebSocket.
	pub fn from_stream<S>(stream: WebSocketStream<S>) -> TransportParts
	where
		S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
	{
		let (sink, stream) = stream.split();
		let (message_tx, message_rx) = mpsc::unbounded_channel();

		TransportParts {
			sender: Box::new(WebSocketTransportSender { sink }),
			receiver: Box::new(WebSocketTransportReceiver { stream, message_tx }),
			message_rx,
		}
	}
}

/// Writing half of [`WebSocketTransport`].
pub struct WebSocketTransportSender<S> {
	sink: SplitSink<WebSocketStream<S>, Message>,
}

#[async_trait]
impl<S> Transport for WebSocketTransportSender<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	async fn send(&mut self, message: Value) -> Result<()> {
		let json = serde_json::to_string(&message)?;
		self.sink.send(Message::Text(json.into())).await?;
		Ok(())
	}

	async fn close(&mut self) -> Result<()> {
		self.sink.close().await?;
		Ok(())
	}
}

/// Reading half of [`WebSocketTransport`].
pub struct WebSocketTransportReceiver<S> {
	stream: SplitStream<WebSocketStream<S>>,
	message_tx: mpsc::UnboundedSender<Value>,
}

#[async_trait]
impl<S> TransportReceiver for WebSocketTransportReceiver<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	async fn run(&mut self) -> Result<()> {
		while let Some(frame) = self.stream.next().await {
			let text = match frame? {
				Message::Text(text) => text.to_string(),
				Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
					Ok(text) => text,
					Err(_) => {
						debug!("ignoring non-UTF-8 binary frame");
						continue;
					}
				},
				Message::Close(frame) => {
					debug!(?frame, "WebSocket closed by remote");
					break;
				}
				_ => continue,
			};

			match serde_json::from_str::<Value>(&text) {
				Ok(value) => {
					if self.message_tx.send(value).is_err() {
						// session dropped its receiver
						break;
					}
				}
				Err(e) => warn!(error = %e, "dropping frame that is not JSON"),
			}
		}
		Ok(())
	}
}
