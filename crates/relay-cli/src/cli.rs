//! Command-line interface definitions.

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use relay_config::LoggingConfig;
use relay_status::TradeType;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Cross-chain bridge and swap executor", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
	/// Path to configuration file
	#[arg(short, long, env = "RELAY_CONFIG")]
	pub config: Option<PathBuf>,

	/// Relay API base URL, overrides the configuration file
	#[arg(long, env = "RELAY_API_URL")]
	pub api_url: Option<String>,

	/// Log level (trace, debug, info, warn, error). Defaults to `logging.level`
	/// from the configuration file
	#[arg(short, long, env = "RELAY_LOG_LEVEL")]
	pub log_level: Option<String>,

	#[command(subcommand)]
	pub command: Command,
}

impl Args {
	/// Level from the command line or environment, falling back to the
	/// configured one.
	pub fn log_level<'a>(&'a self, logging: &'a LoggingConfig) -> &'a str {
		self.log_level.as_deref().unwrap_or(&logging.level)
	}
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Request a quote and print it as JSON
	Quote {
		#[command(flatten)]
		transfer: TransferArgs,

		/// Quoting address. Defaults to the configured wallet
		#[arg(long)]
		user: Option<String>,
	},

	/// Execute a quote with the configured wallet
	Execute(ExecuteArgs),

	/// Show the status of a relay request
	Status {
		request_id: String,

		/// Poll until the request reaches a final status
		#[arg(long)]
		wait: bool,
	},

	/// Claim accrued app fees to a recipient
	ClaimFees {
		#[arg(long)]
		chain_id: u64,

		/// Currency address of the fees
		#[arg(long)]
		currency: String,

		/// Defaults to the configured wallet
		#[arg(long)]
		recipient: Option<String>,
	},

	/// Validate a configuration file
	Validate,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TransferArgs {
	#[arg(long = "from-chain")]
	pub origin_chain_id: u64,

	#[arg(long = "to-chain")]
	pub destination_chain_id: u64,

	/// Currency address on the origin chain
	#[arg(long)]
	pub currency: String,

	/// Currency address on the destination chain. Defaults to `--currency`
	#[arg(long)]
	pub to_currency: Option<String>,

	/// Amount in base units
	#[arg(long)]
	pub amount: String,

	#[arg(long)]
	pub recipient: Option<String>,

	#[arg(long, value_enum, default_value_t = TradeTypeArg::ExactInput)]
	pub trade_type: TradeTypeArg,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExecuteArgs {
	/// Execute a quote saved by `relay quote` instead of requesting one
	#[arg(long, value_name = "FILE")]
	pub quote_file: Option<PathBuf>,

	#[arg(long = "from-chain", required_unless_present = "quote_file", conflicts_with = "quote_file")]
	pub origin_chain_id: Option<u64>,

	#[arg(long = "to-chain", required_unless_present = "quote_file")]
	pub destination_chain_id: Option<u64>,

	#[arg(long, required_unless_present = "quote_file")]
	pub currency: Option<String>,

	#[arg(long)]
	pub to_currency: Option<String>,

	#[arg(long, required_unless_present = "quote_file")]
	pub amount: Option<String>,

	#[arg(long)]
	pub recipient: Option<String>,

	#[arg(long, value_enum, default_value_t = TradeTypeArg::ExactInput)]
	pub trade_type: TradeTypeArg,

	/// Execute quotes routed through several solvers
	#[arg(long)]
	pub accept_split_route: bool,
}

impl ExecuteArgs {
	/// Transfer to quote, when no quote file was given.
	pub fn transfer(&self) -> Option<TransferArgs> {
		Some(TransferArgs {
			origin_chain_id: self.origin_chain_id?,
			destination_chain_id: self.destination_chain_id?,
			currency: self.currency.clone()?,
			to_currency: self.to_currency.clone(),
			amount: self.amount.clone()?,
			recipient: self.recipient.clone(),
			trade_type: self.trade_type,
		})
	}
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeTypeArg {
	ExactInput,
	ExactOutput,
	ExpectedOutput,
}

impl From<TradeTypeArg> for TradeType {
	fn from(arg: TradeTypeArg) -> Self {
		match arg {
			TradeTypeArg::ExactInput => TradeType::ExactInput,
			TradeTypeArg::ExactOutput => TradeType::ExactOutput,
			TradeTypeArg::ExpectedOutput => TradeType::ExpectedOutput,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn test_cli_definition() {
		Args::command().debug_assert();
	}

	#[test]
	fn test_parse_quote() {
		let args = Args::try_parse_from([
			"relay",
			"quote",
			"--from-chain",
			"8453",
			"--to-chain",
			"10",
			"--currency",
			"0x0000000000000000000000000000000000000000",
			"--amount",
			"1000",
			"--trade-type",
			"exact-output",
		])
		.unwrap();

		match args.command {
			Command::Quote { transfer, user } => {
				assert_eq!(transfer.origin_chain_id, 8453);
				assert_eq!(transfer.destination_chain_id, 10);
				assert_eq!(transfer.trade_type, TradeTypeArg::ExactOutput);
				assert!(user.is_none());
			}
			other => panic!("unexpected command {:?}", other),
		}
	}

	#[test]
	fn test_log_level_falls_back_to_config() {
		let logging = LoggingConfig {
			level: "debug".to_string(),
		};

		let args = Args::try_parse_from(["relay", "validate"]).unwrap();
		if args.log_level.is_none() {
			assert_eq!(args.log_level(&logging), "debug");
		}

		let args = Args::try_parse_from(["relay", "--log-level", "warn", "validate"]).unwrap();
		assert_eq!(args.log_level(&logging), "warn");
	}

	#[test]
	fn test_execute_from_file() {
		let args = Args::try_parse_from(["relay", "execute", "--quote-file", "quote.json"]).unwrap();
		match args.command {
			Command::Execute(execute) => {
				assert!(execute.transfer().is_none());
				assert_eq!(execute.quote_file, Some(PathBuf::from("quote.json")));
			}
			other => panic!("unexpected command {:?}", other),
		}

		assert!(Args::try_parse_from(["relay", "execute"]).is_err());
	}
}
