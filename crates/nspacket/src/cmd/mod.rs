use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a JSON packet description into its text line and attachments.
    Encode(EncodeArgs),
    /// Decode a text line and its attachment chunks.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Packet description, e.g. {"type":"event","nsp":"/admin","id":456,"data":["x",1]}.
    /// Objects shaped {"type":"Buffer","data":[..]} become attachments.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the packet description from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Keep attachment bytes inside the text line instead of separate chunks.
    #[arg(long)]
    pub inline: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Packet text line.
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,
    /// Read the packet from a file.
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
    /// Attachment chunk as hex, in index order (repeatable).
    #[arg(long = "chunk", value_name = "HEX")]
    pub chunks: Vec<String>,
    /// Input carries its chunks after the text line, each preceded by a newline.
    #[arg(long, conflicts_with = "chunks")]
    pub embedded: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
