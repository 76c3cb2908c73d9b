mod resolve;
mod targets;

use std::time::Instant;

use cdp_attach_runtime::{Attacher, ChromeEndpoint, TcpDialer};
use serde::Serialize;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use crate::output::{CommandInputs, OutputFormat, ResultBuilder, print_result};
use crate::warnings::CollectingWarnings;

/// Production attacher reporting retry warnings to `warnings`.
type CliAttacher<'w> = Attacher<TcpDialer, ChromeEndpoint, &'w CollectingWarnings>;

pub async fn dispatch(cli: Cli, format: OutputFormat) -> Result<()> {
	let command = cli.command.name();
	let inputs = CommandInputs { port: cli.command.port() };
	let started = Instant::now();
	let warnings = CollectingWarnings::new();

	let fail = |source| CliError {
		command,
		inputs,
		diagnostics: warnings.take_diagnostics(),
		source,
	};

	let attacher: CliAttacher<'_> = Attacher::new(TcpDialer, ChromeEndpoint::new().map_err(fail)?, &warnings);

	match cli.command {
		Commands::Resolve { port } => {
			let url = resolve::execute(&attacher, port).await.map_err(fail)?;
			emit(command, inputs, started, url, &warnings, format);
		}
		Commands::Targets { port } => {
			let data = targets::execute(&attacher, port).await.map_err(fail)?;
			emit(command, inputs, started, data, &warnings, format);
		}
	}
	Ok(())
}

fn emit<T: Serialize>(
	command: &str,
	inputs: CommandInputs,
	started: Instant,
	data: T,
	warnings: &CollectingWarnings,
	format: OutputFormat,
) {
	let result = ResultBuilder::started_at(command, started)
		.inputs(inputs)
		.data(data)
		.diagnostics(warnings.take_diagnostics())
		.build();
	print_result(&result, format);
}
