mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "nspacket", version, about = "Encode and decode namespaced event packets")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "NSPACKET_LOG_LEVEL",
        default_value = "warn",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "nspacket",
            "--format",
            "json",
            "encode",
            "--json",
            r#"{"type":"event","data":["hi"]}"#,
        ])
        .expect("encode args should parse");

        assert!(matches!(cli.command, Command::Encode(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }

    #[test]
    fn rejects_conflicting_inputs() {
        let err = Cli::try_parse_from([
            "nspacket",
            "encode",
            "--json",
            "{}",
            "--file",
            "packet.json",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_repeated_chunks() {
        let cli = Cli::try_parse_from([
            "nspacket",
            "decode",
            "--text",
            "52-[]",
            "--chunk",
            "0102",
            "--chunk",
            "03",
        ])
        .expect("decode args should parse");

        match cli.command {
            Command::Decode(args) => assert_eq!(args.chunks, vec!["0102", "03"]),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
