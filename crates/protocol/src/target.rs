//! Target descriptors and the predicate used to pick one.
//!
//! A target shows up in two shapes: as a [`TargetDescriptor`] in the
//! `/json/list` HTTP document, and as a [`TargetInfo`] inside
//! `Target.targetCreated` / `Target.targetInfoChanged` notifications. Both
//! expose the `type` and `url` fields through [`TargetFields`], which is all
//! [`TargetFilter`] looks at.

use serde::{Deserialize, Serialize};

/// Target type of a top-level tab.
pub const PAGE_TARGET_TYPE: &str = "page";

/// URL of a tab that has not navigated yet.
pub const BLANK_URL: &str = "about:blank";

/// Read access to the fields a [`TargetFilter`] matches on.
pub trait TargetFields {
	fn target_type(&self) -> &str;
	fn url(&self) -> &str;
}

/// One entry of the `GET /json/list` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescriptor {
	pub id: String,
	#[serde(rename = "type")]
	pub target_type: String,
	pub url: String,
	#[serde(default)]
	pub title: String,
	/// Absent when another client is already attached to the target.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub web_socket_debugger_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub devtools_frontend_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl TargetFields for TargetDescriptor {
	fn target_type(&self) -> &str {
		&self.target_type
	}

	fn url(&self) -> &str {
		&self.url
	}
}

/// `GET /json/version` response subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
	#[serde(rename = "Browser", default)]
	pub browser: Option<String>,
	#[serde(rename = "Protocol-Version", default)]
	pub protocol_version: Option<String>,
	/// Browser-level session endpoint (`ws://host:port/devtools/browser/<id>`).
	#[serde(rename = "webSocketDebuggerUrl")]
	pub web_socket_debugger_url: String,
}

/// `Target.TargetInfo` as carried by target lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
	pub target_id: String,
	#[serde(rename = "type")]
	pub target_type: String,
	pub url: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub attached: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub opener_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub browser_context_id: Option<String>,
}

impl TargetFields for TargetInfo {
	fn target_type(&self) -> &str {
		&self.target_type
	}

	fn url(&self) -> &str {
		&self.url
	}
}

/// Params of `Target.targetCreated` and `Target.targetInfoChanged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetEventParams {
	pub target_info: TargetInfo,
}

/// Exact-match predicate over a target's `type` and `url`.
///
/// Every other field of the target is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFilter {
	#[serde(rename = "type")]
	pub target_type: String,
	pub url: String,
}

impl TargetFilter {
	pub fn new(target_type: impl Into<String>, url: impl Into<String>) -> Self {
		Self {
			target_type: target_type.into(),
			url: url.into(),
		}
	}

	/// A freshly created top-level tab that has not navigated anywhere.
	pub fn new_tab() -> Self {
		Self::new(PAGE_TARGET_TYPE, BLANK_URL)
	}

	pub fn matches<T: TargetFields + ?Sized>(&self, target: &T) -> bool {
		target.target_type() == self.target_type && target.url() == self.url
	}

	/// First target in `targets` accepted by this filter.
	pub fn find_in<'a, T: TargetFields>(&self, targets: &'a [T]) -> Option<&'a T> {
		targets.iter().find(|target| self.matches(*target))
	}
}

/// Page-level WebSocket URL for `target_id` on `host:port`.
pub fn page_ws_url(host: &str, port: u16, target_id: &str) -> String {
	format!("ws://{host}:{port}/devtools/page/{target_id}")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn descriptor(target_type: &str, url: &str) -> TargetDescriptor {
		TargetDescriptor {
			id: "T1".into(),
			target_type: target_type.into(),
			url: url.into(),
			title: String::new(),
			web_socket_debugger_url: None,
			devtools_frontend_url: None,
			description: None,
		}
	}

	#[test]
	fn new_tab_filter_matches_blank_page_only() {
		let filter = TargetFilter::new_tab();
		assert!(filter.matches(&descriptor("page", "about:blank")));
		assert!(!filter.matches(&descriptor("page", "https://example.com/")));
		assert!(!filter.matches(&descriptor("service_worker", "about:blank")));
		assert!(!filter.matches(&descriptor("Page", "about:blank")));
	}

	#[test]
	fn filter_ignores_other_fields() {
		let mut target = descriptor("page", "about:blank");
		target.title = "New Tab".into();
		target.description = Some("anything".into());
		assert!(TargetFilter::new_tab().matches(&target));
	}

	#[test]
	fn find_in_returns_first_match() {
		let mut first = descriptor("page", "about:blank");
		first.id = "first".into();
		let mut second = first.clone();
		second.id = "second".into();
		let targets = vec![descriptor("page", "chrome://newtab/"), first, second];

		let found = TargetFilter::new_tab().find_in(&targets).unwrap();
		assert_eq!(found.id, "first");
	}

	#[test]
	fn list_entry_parses_with_and_without_ws_url() {
		let json = r#"[
			{
				"description": "",
				"devtoolsFrontendUrl": "/devtools/inspector.html?ws=127.0.0.1:9222/devtools/page/ABC",
				"id": "ABC",
				"title": "about:blank",
				"type": "page",
				"url": "about:blank",
				"webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/ABC"
			},
			{ "id": "DEF", "type": "iframe", "url": "https://example.com/" }
		]"#;
		let targets: Vec<TargetDescriptor> = serde_json::from_str(json).unwrap();

		assert_eq!(targets.len(), 2);
		assert_eq!(
			targets[0].web_socket_debugger_url.as_deref(),
			Some("ws://127.0.0.1:9222/devtools/page/ABC")
		);
		assert!(targets[1].web_socket_debugger_url.is_none());
		assert_eq!(targets[1].title, "");
	}

	#[test]
	fn target_created_params_parse() {
		let json = r#"{
			"targetInfo": {
				"targetId": "XYZ",
				"type": "page",
				"title": "",
				"url": "about:blank",
				"attached": false,
				"canAccessOpener": false,
				"browserContextId": "CTX"
			}
		}"#;
		let params: TargetEventParams = serde_json::from_str(json).unwrap();

		assert_eq!(params.target_info.target_id, "XYZ");
		assert_eq!(params.target_info.browser_context_id.as_deref(), Some("CTX"));
		assert!(TargetFilter::new_tab().matches(&params.target_info));
	}

	#[test]
	fn version_info_parses_chrome_keys() {
		let json = r#"{
			"Browser": "Chrome/120.0.6099.71",
			"Protocol-Version": "1.3",
			"User-Agent": "Mozilla/5.0",
			"webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/b0b"
		}"#;
		let info: VersionInfo = serde_json::from_str(json).unwrap();

		assert_eq!(info.browser.as_deref(), Some("Chrome/120.0.6099.71"));
		assert_eq!(info.web_socket_debugger_url, "ws://127.0.0.1:9222/devtools/browser/b0b");
	}

	#[test]
	fn page_ws_url_format() {
		assert_eq!(page_ws_url("127.0.0.1", 9222, "ABC"), "ws://127.0.0.1:9222/devtools/page/ABC");
	}
}
