//! End-to-end attach against an in-process fake DevTools endpoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use cdp_attach_runtime::get_ws_target_for;
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Clone)]
struct FakeBrowser {
	port: u16,
	targets: Arc<Vec<Value>>,
	sessions_opened: Arc<AtomicUsize>,
	sessions_closed: Arc<AtomicUsize>,
}

impl FakeBrowser {
	fn new(port: u16, targets: Vec<Value>) -> Self {
		Self {
			port,
			targets: Arc::new(targets),
			sessions_opened: Arc::default(),
			sessions_closed: Arc::default(),
		}
	}

	async fn serve(self, listener: TcpListener) {
		let app = Router::new()
			.route("/json/list", get(list))
			.route("/json/version", get(version))
			.route("/devtools/browser/{id}", get(browser_socket))
			.with_state(self);
		axum::serve(listener, app).await.unwrap();
	}
}

async fn list(State(browser): State<FakeBrowser>) -> Json<Value> {
	Json(Value::Array(browser.targets.as_ref().clone()))
}

async fn version(State(browser): State<FakeBrowser>) -> Json<Value> {
	Json(json!({
		"Browser": "FakeChrome/1.0",
		"Protocol-Version": "1.3",
		"webSocketDebuggerUrl": format!("ws://127.0.0.1:{}/devtools/browser/fake", browser.port),
	}))
}

async fn browser_socket(ws: WebSocketUpgrade, State(browser): State<FakeBrowser>) -> impl IntoResponse {
	ws.on_upgrade(move |socket| handle_browser_socket(socket, browser))
}

/// Answers `Target.setDiscoverTargets`, then announces one blank tab.
async fn handle_browser_socket(mut socket: WebSocket, browser: FakeBrowser) {
	browser.sessions_opened.fetch_add(1, Ordering::SeqCst);

	while let Some(Ok(message)) = socket.recv().await {
		let text = match message {
			Message::Text(text) => text.as_str().to_string(),
			Message::Close(_) => break,
			_ => continue,
		};
		let request: Value = serde_json::from_str(&text).unwrap();

		let reply = json!({"id": request["id"], "result": {}});
		if socket.send(Message::Text(reply.to_string().into())).await.is_err() {
			break;
		}

		if request["method"] == "Target.setDiscoverTargets" {
			let created = json!({
				"method": "Target.targetCreated",
				"params": {"targetInfo": {
					"targetId": "NEWTAB",
					"type": "page",
					"title": "",
					"url": "about:blank",
					"attached": false,
					"browserContextId": "CTX"
				}}
			});
			if socket.send(Message::Text(created.to_string().into())).await.is_err() {
				break;
			}
		}
	}

	browser.sessions_closed.fetch_add(1, Ordering::SeqCst);
}

async fn start(targets: Vec<Value>) -> FakeBrowser {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let port = listener.local_addr().unwrap().port();
	let browser = FakeBrowser::new(port, targets);
	tokio::spawn(browser.clone().serve(listener));
	browser
}

async fn eventually(what: &str, check: impl Fn() -> bool) {
	for _ in 0..100 {
		if check() {
			return;
		}
		tokio::time::sleep(Duration::from_millis(10)).await;
	}
	panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn listed_blank_page_url_is_returned_unchanged() {
	let targets = vec![
		json!({"id": "NAV", "type": "page", "url": "https://example.com/", "webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/page/NAV"}),
		json!({"id": "ABC", "type": "page", "url": "about:blank", "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/ABC"}),
	];
	let browser = start(targets).await;

	let url = get_ws_target_for(u32::from(browser.port)).await.unwrap();

	assert_eq!(url, "ws://127.0.0.1:9222/devtools/page/ABC");
	assert_eq!(browser.sessions_opened.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn announced_tab_url_is_built_from_target_id() {
	let browser = start(vec![]).await;

	let url = get_ws_target_for(u32::from(browser.port)).await.unwrap();

	assert_eq!(url, format!("ws://127.0.0.1:{}/devtools/page/NEWTAB", browser.port));
	assert_eq!(browser.sessions_opened.load(Ordering::SeqCst), 1);
	let closed = Arc::clone(&browser.sessions_closed);
	eventually("discovery session close", move || closed.load(Ordering::SeqCst) == 1).await;
}

#[tokio::test]
async fn waits_for_a_late_listener() {
	let reserved = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr: SocketAddr = reserved.local_addr().unwrap();
	drop(reserved);

	let targets = vec![json!({
		"id": "LATE",
		"type": "page",
		"url": "about:blank",
		"webSocketDebuggerUrl": format!("ws://127.0.0.1:{}/devtools/page/LATE", addr.port()),
	})];
	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_millis(250)).await;
		let listener = TcpListener::bind(addr).await.unwrap();
		FakeBrowser::new(addr.port(), targets).serve(listener).await;
	});

	let url = get_ws_target_for(u32::from(addr.port())).await.unwrap();

	assert_eq!(url, format!("ws://127.0.0.1:{}/devtools/page/LATE", addr.port()));
}

#[tokio::test]
async fn invalid_port_is_rejected() {
	let err = get_ws_target_for(0).await.unwrap_err();
	assert!(matches!(err, cdp_attach_runtime::Error::InvalidPort(0)), "got {err:?}");
}
