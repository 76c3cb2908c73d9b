//! `cdp-attach resolve <PORT>`

use cdp_attach_runtime::{Attacher, DevtoolsEndpoint, Dialer, Result, WarningSink};
use tracing::info;

/// WebSocket debugger URL of the blank tab on `port`.
pub async fn execute<D, E, W>(attacher: &Attacher<D, E, W>, port: u32) -> Result<String>
where
	D: Dialer,
	E: DevtoolsEndpoint,
	W: WarningSink,
{
	let url = attacher.ws_target_for(port).await?;
	info!(port, %url, "resolved blank tab");
	Ok(url)
}
