use std::fs;

use bytes::Bytes;
use nspacket_codec::{decode_embedded, ChunkBoundaries, Decoder, Packet, DEFAULT_SEPARATOR};
use tracing::debug;

use crate::cmd::DecodeArgs;
use crate::exit::{codec_error, io_error, CliError, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = read_input(&args)?;
    let packet = if args.embedded {
        decode_embedded(&input, DEFAULT_SEPARATOR, ChunkBoundaries::Separated)
            .map_err(|err| codec_error("decode failed", err))?
    } else {
        let chunks = parse_chunks(&args.chunks)?;
        decode_with_chunks(trim_line_end(&input), chunks)?
    };

    print_packet(&packet, format);
    Ok(SUCCESS)
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(text) = &args.text {
        return Ok(text.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Err(CliError::usage("one of --text or --file is required"))
}

fn parse_chunks(chunks: &[String]) -> CliResult<Vec<Bytes>> {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            hex::decode(chunk.trim())
                .map(Bytes::from)
                .map_err(|err| CliError::usage(format!("--chunk #{i} is not valid hex: {err}")))
        })
        .collect()
}

fn decode_with_chunks(text: &[u8], chunks: Vec<Bytes>) -> CliResult<Packet> {
    let mut decoder = Decoder::new();
    let expected = decoder
        .decode_text(text)
        .map_err(|err| codec_error("decode failed", err))?;
    debug!(expected, supplied = chunks.len(), "decoded text line");

    for chunk in chunks {
        decoder
            .supply_attachment(chunk)
            .map_err(|err| codec_error("decode failed", err))?;
    }
    decoder
        .finish()
        .map_err(|err| codec_error("decode failed", err))
}

/// Files usually end with a newline that is not part of the packet.
fn trim_line_end(input: &[u8]) -> &[u8] {
    let input = input.strip_suffix(b"\n").unwrap_or(input);
    input.strip_suffix(b"\r").unwrap_or(input)
}
