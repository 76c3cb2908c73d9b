use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use crate::styles::cli_styles;

#[derive(Parser, Debug)]
#[command(name = "cdp-attach")]
#[command(about = "Wait for a browser's remote-debugging port and resolve the WebSocket URL of its new tab")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default), json, ndjson, or toon
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Print the WebSocket debugger URL of the blank tab on PORT
	///
	/// Waits up to ~20s for the port to accept connections, then up to 15s
	/// for an `about:blank` page target to appear.
	#[command(alias = "ws")]
	Resolve {
		/// Remote-debugging port (e.g. 9222)
		port: u32,
	},

	/// List every target exposed on PORT once it accepts connections
	#[command(alias = "list")]
	Targets {
		/// Remote-debugging port (e.g. 9222)
		port: u32,
	},
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Resolve { .. } => "resolve",
			Commands::Targets { .. } => "targets",
		}
	}

	pub fn port(&self) -> u32 {
		match self {
			Commands::Resolve { port } | Commands::Targets { port } => *port,
		}
	}
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn resolve_takes_port_and_format() {
		let cli = Cli::try_parse_from(["cdp-attach", "-f", "json", "resolve", "9222"]).unwrap();
		assert_eq!(cli.format, OutputFormat::Json);
		assert!(matches!(cli.command, Commands::Resolve { port: 9222 }));
		assert_eq!(cli.command.name(), "resolve");
	}

	#[test]
	fn targets_alias_and_verbosity() {
		let cli = Cli::try_parse_from(["cdp-attach", "list", "9333", "-vv"]).unwrap();
		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.command.port(), 9333);
		assert_eq!(cli.command.name(), "targets");
	}

	#[test]
	fn out_of_range_port_still_parses() {
		// range checking is left to the runtime so the error is reported in the envelope
		let cli = Cli::try_parse_from(["cdp-attach", "resolve", "70000"]).unwrap();
		assert_eq!(cli.command.port(), 70000);
	}

	#[test]
	fn negative_port_is_rejected_by_parser() {
		assert!(Cli::try_parse_from(["cdp-attach", "resolve", "-1"]).is_err());
	}
}
