//! `pstate`: inspect and transform persistable state documents
//!
//! Logs go to stderr, filtered by `PSTATE_LOG` or `-v`; results are
//! printed to stdout as JSON.

mod commands;
mod input;

use std::path::PathBuf;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

use crate::commands::Protocol;

fn file_arg() -> Arg {
    Arg::new("file")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON or YAML document")
}

fn cli() -> Command {
    Command::new("pstate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Persistable state reference protocol tool")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Protocol configuration (TOML)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity"),
        )
        .subcommand(
            Command::new("extract")
                .about("Pull references out of a state blob")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("inject")
                .about("Put a saved object's references back into its state")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("load")
                .about("Migrate a saved object to the latest version and inject references")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("migrate")
                .about("Migrate a saved object's attributes")
                .arg(file_arg())
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_parser(value_parser!(u32).range(1..))
                        .help("Target schema version (default: latest)"),
                ),
        )
        .subcommand(
            Command::new("telemetry")
                .about("Aggregate anonymized usage over state blobs")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON or YAML state blobs"),
                ),
        )
        .subcommand(Command::new("kinds").about("List registered kinds"))
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("PSTATE_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn file(args: &ArgMatches) -> Result<&PathBuf> {
    args.get_one::<PathBuf>("file")
        .ok_or_else(|| anyhow::anyhow!("missing input file"))
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let protocol = Protocol::new(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    let output = match matches.subcommand() {
        Some(("extract", args)) => protocol.extract(file(args)?)?,
        Some(("inject", args)) => protocol.inject(file(args)?)?,
        Some(("load", args)) => protocol.load(file(args)?)?,
        Some(("migrate", args)) => protocol.migrate(file(args)?, args.get_one::<u32>("to").copied())?,
        Some(("telemetry", args)) => {
            let files: Vec<PathBuf> = args
                .get_many::<PathBuf>("files")
                .map(|files| files.cloned().collect())
                .unwrap_or_default();
            protocol.telemetry(&files)?
        }
        Some(("kinds", _)) => protocol.kinds(),
        _ => unreachable!("subcommand_required"),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
