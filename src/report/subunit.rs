//! Subunit v2 stream generation.
//!
//! Each result becomes one test: an inprogress event, two file attachments
//! (a structured `details.json` summary and an `ansible` metadata blob, both
//! JSON bodies) and a final status event carrying the host tag and the stop
//! timestamp. Packets are written to the output as they are encoded, so the
//! stream never materializes in memory.
//!
//! The packet framing follows the subunit v2 wire format: a 0xB3 signature,
//! big-endian flags with the protocol version in the top nibble, a
//! variable-length packet length, optional fields in fixed order (timestamp,
//! test id, tags, MIME type, file content) and a trailing CRC32.

use std::collections::HashMap;
use std::fs::File as FsFile;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use log::info;
use once_cell::sync::Lazy;
use serde_json::json;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::Status;
use crate::query::{self, ResultFilter, TaskFilter};
use crate::store::Store;

const SIGNATURE: u8 = 0xB3;
const VERSION: u16 = 0x2000;

const FLAG_TEST_ID: u16 = 0x0800;
const FLAG_TIMESTAMP: u16 = 0x0200;
const FLAG_TAGS: u16 = 0x0080;
const FLAG_FILE_CONTENT: u16 = 0x0040;
const FLAG_MIME_TYPE: u16 = 0x0020;
const FLAG_EOF: u16 = 0x0010;
const STATUS_MASK: u16 = 0x0007;

pub const STATUS_UNDEFINED: u8 = 0x0;
pub const STATUS_INPROGRESS: u8 = 0x2;
pub const STATUS_SUCCESS: u8 = 0x3;
pub const STATUS_SKIP: u8 = 0x5;
pub const STATUS_FAIL: u8 = 0x6;

/// Write the subunit stream for the given scope to `path`.
pub fn write(store: &Store, playbook: Option<i64>, path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = FsFile::create(path)?;
    let mut out = BufWriter::new(file);
    generate(store, playbook, config, &mut out)?;
    out.flush()?;
    info!("Wrote subunit stream to {}", path.display());
    Ok(())
}

/// Stream one test per result into `out`.
pub fn generate<W: Write>(
    store: &Store,
    playbook: Option<i64>,
    config: &Config,
    out: &mut W,
) -> Result<()> {
    let playbooks: HashMap<i64, _> = super::scoped_playbooks(store, playbook)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let results = query::results(store, &ResultFilter { playbook, ..Default::default() })?;
    super::warn_if_empty(&results, config, "subunit");

    let plays: HashMap<i64, _> = query::plays(store, playbook)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let tasks: HashMap<i64, _> = query::tasks(store, &TaskFilter { playbook, play: None })?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
    let hosts: HashMap<i64, _> = query::hosts(store, playbook)?
        .into_iter()
        .map(|h| (h.id, h))
        .collect();

    for result in &results {
        // Rows reference their parents through NOT NULL foreign keys, so
        // these lookups can only miss if the store was tampered with.
        let task = tasks
            .get(&result.task_id)
            .ok_or_else(|| Error::not_found("task", result.task_id))?;
        let play = plays
            .get(&result.play_id)
            .ok_or_else(|| Error::not_found("play", result.play_id))?;
        let host = hosts
            .get(&result.host_id)
            .ok_or_else(|| Error::not_found("host", result.host_id))?;
        let playbook = playbooks
            .get(&result.playbook_id)
            .ok_or_else(|| Error::not_found("playbook", result.playbook_id))?;

        let test_id = result.id.to_string();
        let start = result.started_at;
        let stop = result.ended_at.unwrap_or(result.started_at);
        let status = match result.status {
            Status::Ok | Status::Changed => STATUS_SUCCESS,
            Status::Failed | Status::Unreachable => STATUS_FAIL,
            Status::Skipped => STATUS_SKIP,
        };
        let tags = vec![host.name.clone()];

        let details = json!({
            "status": status_name(status),
            "tags": tags,
            "stop": stop.to_rfc3339(),
            "start": start.to_rfc3339(),
            "details": {"ansible": "application/json"},
            "id": test_id,
        });
        let metadata = json!({
            "host": host.name,
            "playbook_id": playbook.id,
            "playbook_path": playbook.path,
            "play_name": play.name,
            "task_action": task.action,
            "task_action_lineno": task.lineno,
            "task_id": task.id,
            "task_name": task.name,
            "task_path": task.path,
        });

        write_packet(
            out,
            &Packet {
                status: STATUS_INPROGRESS,
                test_id: Some(&test_id),
                timestamp: Some(start),
                ..Default::default()
            },
        )?;
        for (name, body) in [("details.json", &details), ("ansible", &metadata)] {
            write_packet(
                out,
                &Packet {
                    status: STATUS_UNDEFINED,
                    test_id: Some(&test_id),
                    timestamp: Some(stop),
                    mime_type: Some("application/json"),
                    file: Some((name, serde_json::to_vec(body)?)),
                    eof: true,
                    ..Default::default()
                },
            )?;
        }
        write_packet(
            out,
            &Packet {
                status,
                test_id: Some(&test_id),
                timestamp: Some(stop),
                tags: Some(&tags),
                ..Default::default()
            },
        )?;
    }

    Ok(())
}

fn status_name(status: u8) -> &'static str {
    match status {
        STATUS_INPROGRESS => "inprogress",
        STATUS_SUCCESS => "success",
        STATUS_SKIP => "skip",
        STATUS_FAIL => "fail",
        _ => "undefined",
    }
}

// Packet encoding ----------------------------------------------------------

#[derive(Default)]
struct Packet<'a> {
    status: u8,
    test_id: Option<&'a str>,
    timestamp: Option<DateTime<Utc>>,
    tags: Option<&'a [String]>,
    mime_type: Option<&'a str>,
    file: Option<(&'a str, Vec<u8>)>,
    eof: bool,
}

fn write_packet<W: Write>(out: &mut W, packet: &Packet<'_>) -> Result<()> {
    let mut flags = VERSION | u16::from(packet.status) & STATUS_MASK;
    let mut body = Vec::new();

    if let Some(ts) = packet.timestamp {
        flags |= FLAG_TIMESTAMP;
        // The wire format carries seconds as an unsigned 32-bit value, so
        // timestamps outside 1970..2106 are pinned to the representable range.
        let secs = ts.timestamp().clamp(0, i64::from(u32::MAX)) as u32;
        body.extend_from_slice(&secs.to_be_bytes());
        push_number(&mut body, ts.timestamp_subsec_nanos());
    }
    if let Some(test_id) = packet.test_id {
        flags |= FLAG_TEST_ID;
        push_utf8(&mut body, test_id);
    }
    if let Some(tags) = packet.tags {
        flags |= FLAG_TAGS;
        push_number(&mut body, tags.len() as u32);
        for tag in tags {
            push_utf8(&mut body, tag);
        }
    }
    if let Some(mime) = packet.mime_type {
        flags |= FLAG_MIME_TYPE;
        push_utf8(&mut body, mime);
    }
    if let Some((name, content)) = &packet.file {
        flags |= FLAG_FILE_CONTENT;
        push_utf8(&mut body, name);
        push_number(&mut body, content.len() as u32);
        body.extend_from_slice(content);
    }
    if packet.eof {
        flags |= FLAG_EOF;
    }

    // signature + flags + fields + crc, plus the length field itself whose
    // encoded width depends on the total it encodes.
    let base = 1 + 2 + body.len() + 4;
    let total = (1..=4)
        .map(|width| base + width)
        .find(|candidate| number_width(*candidate as u32) == candidate - base)
        .expect("packet too large for subunit framing");

    let mut packet_bytes = Vec::with_capacity(total);
    packet_bytes.push(SIGNATURE);
    packet_bytes.extend_from_slice(&flags.to_be_bytes());
    push_number(&mut packet_bytes, total as u32);
    packet_bytes.extend_from_slice(&body);
    let crc = crc32(&packet_bytes);
    packet_bytes.extend_from_slice(&crc.to_be_bytes());

    out.write_all(&packet_bytes)?;
    Ok(())
}

/// Variable-width number: the two high bits of the first byte select a width
/// of one to four bytes, leaving 6/14/22/30 bits for the value.
fn push_number(buf: &mut Vec<u8>, value: u32) {
    match number_width(value) {
        1 => buf.push(value as u8),
        2 => buf.extend_from_slice(&((value | 0x4000) as u16).to_be_bytes()),
        3 => {
            let v = value | 0x80_0000;
            buf.extend_from_slice(&[(v >> 16) as u8, (v >> 8) as u8, v as u8]);
        }
        _ => buf.extend_from_slice(&(value | 0xC000_0000).to_be_bytes()),
    }
}

fn number_width(value: u32) -> usize {
    if value < 1 << 6 {
        1
    } else if value < 1 << 14 {
        2
    } else if value < 1 << 22 {
        3
    } else {
        4
    }
}

fn push_utf8(buf: &mut Vec<u8>, value: &str) {
    push_number(buf, value.len() as u32);
    buf.extend_from_slice(value.as_bytes());
}

static CRC_TABLE: Lazy<[u32; 256]> = Lazy::new(|| {
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut crc = i as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { 0xEDB8_8320 ^ (crc >> 1) } else { crc >> 1 };
        }
        *entry = crc;
    }
    table
});

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for byte in data {
        crc = CRC_TABLE[((crc ^ u32::from(*byte)) & 0xFF) as usize] ^ (crc >> 8);
    }
    !crc
}

// Stream reading -----------------------------------------------------------

/// A decoded packet. Used to verify generated streams.
#[derive(Debug, Clone, Default)]
pub struct Event {
    pub status: u8,
    pub test_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    pub file_content: Option<Vec<u8>>,
    pub eof: bool,
}

/// Decode a complete stream, validating framing and checksums.
pub fn read_events(stream: &[u8]) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    let mut pos = 0;
    while pos < stream.len() {
        let (event, consumed) = read_packet(&stream[pos..])?;
        events.push(event);
        pos += consumed;
    }
    Ok(events)
}

fn read_packet(data: &[u8]) -> Result<(Event, usize)> {
    if data.len() < 6 || data[0] != SIGNATURE {
        return Err(malformed("bad packet signature"));
    }
    let flags = u16::from_be_bytes([data[1], data[2]]);
    let mut pos = 3;
    let total = read_number(data, &mut pos)? as usize;
    if total > data.len() || total < pos + 4 {
        return Err(malformed("truncated packet"));
    }
    let crc_pos = total - 4;
    let expected = u32::from_be_bytes([data[crc_pos], data[crc_pos + 1], data[crc_pos + 2], data[crc_pos + 3]]);
    if crc32(&data[..crc_pos]) != expected {
        return Err(malformed("packet checksum mismatch"));
    }

    let mut event = Event {
        status: (flags & STATUS_MASK) as u8,
        eof: flags & FLAG_EOF != 0,
        ..Default::default()
    };
    if flags & FLAG_TIMESTAMP != 0 {
        if pos + 4 > crc_pos {
            return Err(malformed("truncated timestamp"));
        }
        let secs = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
        pos += 4;
        let nanos = read_number(data, &mut pos)?;
        event.timestamp = Utc.timestamp_opt(i64::from(secs), nanos).single();
    }
    if flags & FLAG_TEST_ID != 0 {
        event.test_id = Some(read_utf8(data, &mut pos, crc_pos)?);
    }
    if flags & FLAG_TAGS != 0 {
        let count = read_number(data, &mut pos)?;
        for _ in 0..count {
            event.tags.push(read_utf8(data, &mut pos, crc_pos)?);
        }
    }
    if flags & FLAG_MIME_TYPE != 0 {
        event.mime_type = Some(read_utf8(data, &mut pos, crc_pos)?);
    }
    if flags & FLAG_FILE_CONTENT != 0 {
        event.file_name = Some(read_utf8(data, &mut pos, crc_pos)?);
        let len = read_number(data, &mut pos)? as usize;
        if pos + len > crc_pos {
            return Err(malformed("truncated file content"));
        }
        event.file_content = Some(data[pos..pos + len].to_vec());
        pos += len;
    }

    Ok((event, total))
}

fn read_number(data: &[u8], pos: &mut usize) -> Result<u32> {
    let first = *data.get(*pos).ok_or_else(|| malformed("truncated number"))?;
    let width = ((first >> 6) + 1) as usize;
    if *pos + width > data.len() {
        return Err(malformed("truncated number"));
    }
    let mut value = u32::from(first & 0x3F);
    for i in 1..width {
        value = (value << 8) | u32::from(data[*pos + i]);
    }
    *pos += width;
    Ok(value)
}

fn read_utf8(data: &[u8], pos: &mut usize, limit: usize) -> Result<String> {
    let len = read_number(data, pos)? as usize;
    if *pos + len > limit {
        return Err(malformed("truncated string"));
    }
    let s = std::str::from_utf8(&data[*pos..*pos + len])
        .map_err(|_| malformed("invalid utf-8 in packet"))?
        .to_string();
    *pos += len;
    Ok(s)
}

fn malformed(msg: &str) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, msg.to_string()))
}
