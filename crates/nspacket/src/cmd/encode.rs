use std::fs;

use nspacket_codec::{AttachmentMode, Encoder, EncoderConfig, Header, Packet, PacketType, Value};
use serde::Deserialize;
use tracing::debug;

use crate::cmd::EncodeArgs;
use crate::exit::{codec_error, io_error, CliError, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

/// JSON packet description accepted by `encode` (and printed by `decode`).
#[derive(Debug, Deserialize)]
struct PacketDescription {
    #[serde(rename = "type")]
    packet_type: String,
    #[serde(default)]
    nsp: Option<String>,
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let source = read_description(&args)?;
    let packet = parse_packet(&source)?;
    debug!(
        packet_type = %packet.header.packet_type,
        namespace = %packet.header.namespace,
        "parsed packet description"
    );

    let mode = if args.inline {
        AttachmentMode::Inline
    } else {
        AttachmentMode::Multiplex
    };
    let encoded = Encoder::with_config(EncoderConfig {
        attachment_mode: mode,
    })
    .encode(&packet)
    .map_err(|err| codec_error("encode failed", err))?;

    print_encoded(&encoded, format);
    Ok(SUCCESS)
}

fn read_description(args: &EncodeArgs) -> CliResult<String> {
    if let Some(json) = &args.json {
        return Ok(json.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Err(CliError::usage("one of --json or --file is required"))
}

fn parse_packet(source: &str) -> CliResult<Packet> {
    let description: PacketDescription = serde_json::from_str(source)
        .map_err(|err| CliError::usage(format!("invalid packet description: {err}")))?;

    let packet_type = PacketType::from_name(&description.packet_type).ok_or_else(|| {
        CliError::usage(format!("unknown packet type: {}", description.packet_type))
    })?;

    let mut header = Header::new(packet_type).with_namespace(parse_namespace(description.nsp)?);
    if let Some(id) = description.id {
        header = header.with_ack_id(id);
    }

    let payload = description
        .data
        .map(|items| items.into_iter().map(Value::from_json).collect());
    Ok(Packet { header, payload })
}

/// `/` and a missing namespace both mean the root namespace.
fn parse_namespace(nsp: Option<String>) -> CliResult<String> {
    match nsp.as_deref() {
        None | Some("") | Some("/") => Ok(String::new()),
        Some(ns) if !ns.starts_with('/') => Err(CliError::usage(format!(
            "namespace must start with '/': {ns}"
        ))),
        Some(ns) if ns.contains(',') => Err(CliError::usage(format!(
            "namespace must not contain ',': {ns}"
        ))),
        Some(ns) => Ok(ns.to_string()),
    }
}
