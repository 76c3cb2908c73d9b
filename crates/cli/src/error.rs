use cdp_attach_runtime::Error as RuntimeError;
use thiserror::Error;

use crate::output::{CommandError, CommandInputs, Diagnostic, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

/// A failed command, with what the failure envelope needs.
#[derive(Debug, Error)]
#[error("{command} failed: {source}")]
pub struct CliError {
	pub command: &'static str,
	pub inputs: CommandInputs,
	/// Warnings raised before the failure
	pub diagnostics: Vec<Diagnostic>,
	#[source]
	pub source: RuntimeError,
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let message = self.source.to_string();

		let (code, details) = match &self.source {
			RuntimeError::InvalidPort(port) => (ErrorCode::InvalidInput, Some(serde_json::json!({ "port": port }))),
			RuntimeError::ConnectionFailed { port, source } => (
				ErrorCode::ConnectionFailed,
				Some(serde_json::json!({ "port": port, "lastError": source.to_string() })),
			),
			RuntimeError::TargetNotFound { port, target_type, url } => (
				ErrorCode::TargetNotFound,
				Some(serde_json::json!({ "port": port, "type": target_type, "url": url })),
			),
			RuntimeError::Remote { code, .. } => (ErrorCode::ProtocolError, Some(serde_json::json!({ "remoteCode": code }))),
			RuntimeError::Http(_) | RuntimeError::Transport(_) | RuntimeError::ChannelClosed | RuntimeError::Json(_) => {
				(ErrorCode::ProtocolError, None)
			}
			RuntimeError::Io(_) => (ErrorCode::InternalError, None),
		};

		CommandError { code, message, details }
	}
}
