//! TLS record layer framing.
//!
//! Splits reassembled TCP payload bytes into TLS records. A record may
//! straddle TCP segment boundaries, so splitting reports how far it got and
//! leaves the incomplete tail to the caller.

use crate::error::{Result, TlsError};
use crate::handshake::{MSG_CLIENT_HELLO, MSG_SERVER_HELLO};
use std::fmt;

/// Record header size on the wire.
pub const RECORD_HEADER_LEN: usize = 5;

/// Largest plaintext fragment a record may carry.
pub const MAX_PLAINTEXT_LEN: usize = 1 << 14;

/// Upper bound accepted for a record length field. Encrypted records may
/// exceed the plaintext limit by the AEAD expansion allowance.
pub const MAX_RECORD_LEN: usize = (1 << 14) + 2048;

/// TLS 1.2 / legacy record version.
pub const TLS12: u16 = 0x0303;

/// TLS 1.3 as selected through the supported_versions extension.
pub const TLS13: u16 = 0x0304;

/// Record-layer content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContentType {
    ChangeCipherSpec = 0x14,
    Alert = 0x15,
    Handshake = 0x16,
    ApplicationData = 0x17,
}

impl ContentType {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x14 => Some(ContentType::ChangeCipherSpec),
            0x15 => Some(ContentType::Alert),
            0x16 => Some(ContentType::Handshake),
            0x17 => Some(ContentType::ApplicationData),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::ChangeCipherSpec => write!(f, "ChangeCipherSpec"),
            ContentType::Alert => write!(f, "Alert"),
            ContentType::Handshake => write!(f, "Handshake"),
            ContentType::ApplicationData => write!(f, "Application Data"),
        }
    }
}

/// One TLS record with an owned payload.
///
/// The payload is exactly the fragment that followed the 5-byte header on
/// the wire; re-encoding with [`TlsRecord::to_bytes`] reproduces the header
/// length field from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsRecord {
    pub content_type: ContentType,
    /// Legacy version from the record header (0x0301..0x0304).
    pub version: u16,
    pub payload: Vec<u8>,
}

impl TlsRecord {
    pub fn new(content_type: ContentType, version: u16, payload: Vec<u8>) -> Self {
        Self {
            content_type,
            version,
            payload,
        }
    }

    /// Wire encoding: 5-byte header followed by the payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RECORD_HEADER_LEN + self.payload.len());
        out.push(self.content_type as u8);
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Result of running [`extract_records`] over a list of segment payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordExtraction {
    pub records: Vec<TlsRecord>,
    /// True when bytes past the last complete record were left unconsumed.
    pub has_remainder: bool,
}

/// Splits a byte stream into complete TLS records.
///
/// Returns the records fully contained in `payload` together with the
/// number of bytes consumed. When the stream ends inside a record, the
/// records parsed so far are returned and the consumed length points at the
/// first byte of the incomplete record; the caller keeps the tail and
/// retries once more data has arrived.
///
/// An unknown content type or an oversized length field aborts the split:
/// framing for the direction is lost at that point.
pub fn split_records(payload: &[u8]) -> Result<(Vec<TlsRecord>, usize)> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while payload.len().saturating_sub(offset) >= RECORD_HEADER_LEN {
        let header = &payload[offset..offset + RECORD_HEADER_LEN];
        let content_type =
            ContentType::from_u8(header[0]).ok_or(TlsError::BadContentType(header[0]))?;
        let version = u16::from_be_bytes([header[1], header[2]]);
        let length = u16::from_be_bytes([header[3], header[4]]) as usize;

        if length > MAX_RECORD_LEN {
            return Err(TlsError::BadLength(length));
        }

        let end = offset + RECORD_HEADER_LEN + length;
        if payload.len() < end {
            // Record continues in a segment we have not seen yet.
            break;
        }

        records.push(TlsRecord::new(
            content_type,
            version,
            payload[offset + RECORD_HEADER_LEN..end].to_vec(),
        ));
        offset = end;
    }

    Ok((records, offset))
}

/// Concatenates segment payloads and splits the joined stream into records.
pub fn extract_records(payloads: &[Vec<u8>]) -> Result<RecordExtraction> {
    let total: usize = payloads.iter().map(Vec::len).sum();
    let mut stream = Vec::with_capacity(total);
    for payload in payloads {
        stream.extend_from_slice(payload);
    }

    let (records, consumed) = split_records(&stream)?;
    Ok(RecordExtraction {
        records,
        has_remainder: consumed < stream.len(),
    })
}

/// Heuristic check that a TCP payload starts with a TLS record header.
///
/// Used to tell TLS from arbitrary TCP at stream-open time; never
/// authoritative.
pub fn is_tls_payload(payload: &[u8]) -> bool {
    if payload.len() < RECORD_HEADER_LEN {
        return false;
    }
    if ContentType::from_u8(payload[0]).is_none() {
        return false;
    }
    let version = u16::from_be_bytes([payload[1], payload[2]]);
    if !(0x0301..=0x0304).contains(&version) {
        return false;
    }
    u16::from_be_bytes([payload[3], payload[4]]) as usize <= MAX_RECORD_LEN
}

/// True when the record carries a handshake message starting with ClientHello.
pub fn is_client_hello(record: &TlsRecord) -> bool {
    record.content_type == ContentType::Handshake
        && record.payload.first() == Some(&MSG_CLIENT_HELLO)
}

/// True when the record carries a handshake message starting with ServerHello.
pub fn is_server_hello(record: &TlsRecord) -> bool {
    record.content_type == ContentType::Handshake
        && record.payload.first() == Some(&MSG_SERVER_HELLO)
}

pub fn is_alert(record: &TlsRecord) -> bool {
    record.content_type == ContentType::Alert
}

pub fn is_application_data(record: &TlsRecord) -> bool {
    record.content_type == ContentType::ApplicationData
}
