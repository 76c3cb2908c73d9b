//! Retry warnings for a terminal user.

use cdp_attach_runtime::{Warning, WarningSink};
use parking_lot::Mutex;
use tracing::debug;

use crate::output::{Diagnostic, DiagnosticLevel};

/// Prints each warning to stderr as it happens and keeps it for the result
/// envelope.
#[derive(Debug, Default)]
pub struct CollectingWarnings {
	seen: Mutex<Vec<Warning>>,
}

impl CollectingWarnings {
	pub fn new() -> Self {
		Self::default()
	}

	/// Drains the collected warnings as `warning` diagnostics.
	pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
		std::mem::take(&mut *self.seen.lock())
			.into_iter()
			.map(|warning| Diagnostic {
				level: DiagnosticLevel::Warning,
				message: warning.to_string(),
				source: Some(warning.code().to_string()),
			})
			.collect()
	}
}

impl WarningSink for CollectingWarnings {
	fn warn(&self, warning: &Warning) {
		debug!(code = warning.code(), "{warning}");
		eprintln!("warning: {warning}");
		self.seen.lock().push(warning.clone());
	}
}
