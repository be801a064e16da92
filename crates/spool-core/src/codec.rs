//! Record codec.
//!
//! A record is one JSON header line followed by the raw payload:
//!
//! ```text
//! {"format":1,"kind":"transmission","content_type":"application/json","content_encoding":"gzip","len":42}\n
//! <42 payload bytes>
//! ```
//!
//! The spool directory may be writable by other local users, so its contents
//! are untrusted. Decoding looks at the `kind` tag first and refuses anything
//! outside [`RecordKind::ALLOWED`] before the rest of the header or the body
//! is interpreted.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use spool_common::{Error, Result, RECORD_FORMAT_VERSION};

use crate::transmission::Transmission;

/// Longest header line accepted, newline excluded.
pub const MAX_HEADER_LEN: usize = 4096;

/// Record kinds that may be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A transmission with content metadata.
    Transmission,
    /// A bare byte payload.
    RawBytes,
}

impl RecordKind {
    /// The allow-list. Any other tag is rejected.
    pub const ALLOWED: [RecordKind; 2] = [RecordKind::Transmission, RecordKind::RawBytes];

    pub fn tag(&self) -> &'static str {
        match self {
            RecordKind::Transmission => "transmission",
            RecordKind::RawBytes => "bytes",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALLOWED.into_iter().find(|kind| kind.tag() == tag)
    }
}

/// Only the fields needed to decide whether a record may be decoded.
#[derive(Deserialize)]
struct KindTag {
    kind: String,
}

#[derive(Serialize, Deserialize)]
struct RecordHeader {
    format: u32,
    kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    content_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    content_encoding: String,
    len: u64,
}

/// Write `transmission` as a record.
pub fn write_record<W: Write>(writer: &mut W, transmission: &Transmission) -> io::Result<()> {
    let header = RecordHeader {
        format: RECORD_FORMAT_VERSION,
        kind: RecordKind::Transmission.tag().to_string(),
        content_type: transmission.content_type().to_string(),
        content_encoding: transmission.content_encoding().to_string(),
        len: transmission.len() as u64,
    };
    write_with_header(writer, &header, transmission.content())
}

/// Write a bare byte payload as a record.
pub fn write_raw<W: Write>(writer: &mut W, content: &[u8]) -> io::Result<()> {
    let header = RecordHeader {
        format: RECORD_FORMAT_VERSION,
        kind: RecordKind::RawBytes.tag().to_string(),
        content_type: String::new(),
        content_encoding: String::new(),
        len: content.len() as u64,
    };
    write_with_header(writer, &header, content)
}

/// Fails with [`io::ErrorKind::InvalidInput`] when the header line would be
/// longer than [`MAX_HEADER_LEN`], since [`decode`] could not read it back.
fn write_with_header<W: Write>(writer: &mut W, header: &RecordHeader, body: &[u8]) -> io::Result<()> {
    let line = serde_json::to_vec(header).map_err(io::Error::from)?;
    if line.len() > MAX_HEADER_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "record header is {} bytes, limit is {}",
                line.len(),
                MAX_HEADER_LEN
            ),
        ));
    }
    writer.write_all(&line)?;
    writer.write_all(b"\n")?;
    writer.write_all(body)?;
    Ok(())
}

/// Encode `transmission` into a new buffer.
pub fn encode(transmission: &Transmission) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(transmission.len() + 128);
    write_record(&mut buf, transmission)?;
    Ok(buf)
}

/// Encode a bare byte payload into a new buffer.
pub fn encode_raw(content: &[u8]) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(content.len() + 64);
    write_raw(&mut buf, content)?;
    Ok(buf)
}

/// Decode a record.
///
/// Errors:
/// - [`Error::DecodeRejected`] when the kind is not allow-listed
/// - [`Error::DecodeCorrupt`] for everything else that is not a valid record
pub fn decode(bytes: &[u8]) -> Result<Transmission> {
    let newline = bytes
        .iter()
        .take(MAX_HEADER_LEN + 1)
        .position(|b| *b == b'\n')
        .ok_or_else(|| Error::DecodeCorrupt("missing record header".to_string()))?;
    let (header_bytes, body) = (&bytes[..newline], &bytes[newline + 1..]);

    let tagged: KindTag = serde_json::from_slice(header_bytes)
        .map_err(|e| Error::DecodeCorrupt(format!("unreadable header: {}", e)))?;
    let kind = RecordKind::from_tag(&tagged.kind).ok_or(Error::DecodeRejected {
        type_tag: tagged.kind,
    })?;

    let header: RecordHeader = serde_json::from_slice(header_bytes)
        .map_err(|e| Error::DecodeCorrupt(format!("unreadable header: {}", e)))?;
    if header.format != RECORD_FORMAT_VERSION {
        return Err(Error::DecodeCorrupt(format!(
            "unsupported record format {}",
            header.format
        )));
    }
    if header.len != body.len() as u64 {
        return Err(Error::DecodeCorrupt(format!(
            "payload length {} does not match header length {}",
            body.len(),
            header.len
        )));
    }

    Ok(match kind {
        RecordKind::Transmission => Transmission::new(
            body.to_vec(),
            header.content_type,
            header.content_encoding,
        ),
        RecordKind::RawBytes => Transmission::from_bytes(body.to_vec()),
    })
}

/// Read and decode the record stored at `path`.
pub fn read_record(path: &Path) -> Result<Transmission> {
    let bytes = fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&bytes)
}
