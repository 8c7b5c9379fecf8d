use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use nspacket_codec::{count_placeholders, AttachmentMode, EncodedPacket, Packet, DEFAULT_SEPARATOR};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput {
    text: String,
    attachments: Vec<String>,
}

/// Print an encoded packet. `Raw` writes the embedded form: the text line,
/// then each chunk preceded by a newline.
pub fn print_encoded(encoded: &EncodedPacket, format: OutputFormat) {
    let text = String::from_utf8_lossy(&encoded.text).into_owned();
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                text,
                attachments: encoded.attachments.iter().map(hex::encode).collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PART", "SIZE", "CONTENT"])
                .add_row(vec!["text".to_string(), encoded.text.len().to_string(), text]);
            for (i, chunk) in encoded.attachments.iter().enumerate() {
                table.add_row(vec![
                    format!("attachment {i}"),
                    chunk.len().to_string(),
                    hex::encode(chunk),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("text: {text}");
            for (i, chunk) in encoded.attachments.iter().enumerate() {
                println!(
                    "attachment[{i}]: {} ({} bytes)",
                    hex::encode(chunk),
                    chunk.len()
                );
            }
        }
        OutputFormat::Raw => {
            let mut out = Vec::with_capacity(encoded.text.len());
            out.extend_from_slice(&encoded.text);
            for chunk in &encoded.attachments {
                out.push(DEFAULT_SEPARATOR);
                out.extend_from_slice(chunk);
            }
            print_raw(&out);
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    #[serde(rename = "type")]
    packet_type: &'static str,
    nsp: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<&'a str>,
    attachments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl<'a> PacketOutput<'a> {
    fn new(packet: &'a Packet) -> Self {
        let namespace = packet.header.namespace.as_str();
        Self {
            packet_type: packet.header.packet_type.name(),
            nsp: if namespace.is_empty() { "/" } else { namespace },
            id: packet.header.ack(),
            event: packet.event_name(),
            attachments: count_placeholders(packet.args()),
            data: packet.payload.as_ref().map(|items| {
                serde_json::Value::Array(
                    items
                        .iter()
                        .map(|item| item.to_json(AttachmentMode::Inline))
                        .collect(),
                )
            }),
        }
    }

    fn data_string(&self) -> String {
        self.data
            .as_ref()
            .and_then(|data| serde_json::to_string(data).ok())
            .unwrap_or_default()
    }
}

/// Print a decoded packet. Attachments are rendered as inline buffers, so
/// JSON output can be fed back to `encode`.
pub fn print_packet(packet: &Packet, format: OutputFormat) {
    let out = PacketOutput::new(packet);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["type", out.packet_type])
                .add_row(vec!["nsp", out.nsp]);
            if let Some(id) = out.id {
                table.add_row(vec!["id".to_string(), id.to_string()]);
            }
            if let Some(event) = out.event {
                table.add_row(vec!["event", event]);
            }
            table.add_row(vec!["attachments".to_string(), out.attachments.to_string()]);
            table.add_row(vec!["data".to_string(), out.data_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let id = out.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
            println!(
                "type={} nsp={} id={} attachments={} data={}",
                out.packet_type,
                out.nsp,
                id,
                out.attachments,
                out.data_string()
            );
        }
        OutputFormat::Raw => {
            let mut data = out.data_string().into_bytes();
            data.push(b'\n');
            print_raw(&data);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use nspacket_codec::{Header, PacketType, Value};

    use super::*;

    #[test]
    fn packet_output_uses_root_slash_and_inline_buffers() {
        let packet = Packet::with_payload(
            Header::new(PacketType::Event).with_ack_id(7),
            vec![Value::from("upload"), Value::bytes(vec![1u8, 2])],
        );
        let out = PacketOutput::new(&packet);
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(
            json,
            r#"{"type":"event","nsp":"/","id":7,"event":"upload","attachments":0,"data":["upload",{"type":"Buffer","data":[1,2]}]}"#
        );
    }

    #[test]
    fn packet_output_omits_absent_fields() {
        let packet = Packet::new(Header::new(PacketType::Connect).with_namespace("/admin"));
        let json = serde_json::to_string(&PacketOutput::new(&packet)).unwrap();
        assert_eq!(json, r#"{"type":"connect","nsp":"/admin","attachments":0}"#);
    }
}
