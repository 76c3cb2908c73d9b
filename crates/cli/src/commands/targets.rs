//! `cdp-attach targets <PORT>`

use cdp_attach_runtime::{Attacher, DevtoolsEndpoint, Dialer, Result, WarningSink};
use tracing::info;

use crate::output::TargetsData;

pub async fn execute<D, E, W>(attacher: &Attacher<D, E, W>, port: u32) -> Result<TargetsData>
where
	D: Dialer,
	E: DevtoolsEndpoint,
	W: WarningSink,
{
	let targets = attacher.targets_for(port).await?;
	info!(port, count = targets.len(), "listed targets");
	Ok(targets.into())
}
