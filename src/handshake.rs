//! ClientHello and ServerHello dissection.
//!
//! Parsers take the hello *body*: the outer 5-byte record header and the
//! 4-byte handshake header must already be stripped. The `*_from_record`
//! wrappers validate and strip both, which is the usual entry point when
//! walking records produced by the record layer.

use crate::error::{Result, TlsError};
use crate::record::{is_client_hello, split_records, ContentType, TlsRecord};
use crate::wire::Cursor;

/// Handshake message types.
pub const MSG_CLIENT_HELLO: u8 = 0x01;
pub const MSG_SERVER_HELLO: u8 = 0x02;
pub const MSG_CERTIFICATE: u8 = 0x0b;

/// Extension types this crate interprets.
pub mod extension {
    pub const SERVER_NAME: u16 = 0x0000;
    pub const SUPPORTED_VERSIONS: u16 = 0x002b;
}

/// ClientHello fields, owned.
///
/// Cipher suites, compression methods and extensions are kept as the raw
/// wire blobs; targeted extractors decode them on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub client_version: u16,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    /// Raw cipher suite list, two bytes per entry.
    pub cipher_suites: Vec<u8>,
    pub compression_methods: Vec<u8>,
    pub extensions: Vec<u8>,
}

/// ServerHello fields, owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub server_version: u16,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suite: u16,
    pub compression_method: u8,
    pub extensions: Vec<u8>,
}

/// Parses a ClientHello body.
///
/// The input must start at the legacy client_version field and end with the
/// extensions blob.
pub fn parse_client_hello(body: &[u8]) -> Result<ClientHello> {
    let mut cursor = Cursor::new(body);

    let client_version = cursor.read_u16()?;
    let random = cursor.read_array::<32>()?;
    let session_id = cursor.read_vec8()?.to_vec();
    if session_id.len() > 32 {
        return Err(TlsError::BadFormat(format!(
            "session_id length {} exceeds 32",
            session_id.len()
        )));
    }
    let cipher_suites = cursor.read_vec16()?.to_vec();
    if cipher_suites.len() % 2 != 0 {
        return Err(TlsError::BadFormat(
            "odd cipher_suites length".to_string(),
        ));
    }
    let compression_methods = cursor.read_vec8()?.to_vec();
    let extensions = cursor.read_vec16()?.to_vec();
    if !cursor.is_empty() {
        return Err(TlsError::BadFormat(format!(
            "{} trailing bytes after extensions",
            cursor.remaining()
        )));
    }

    Ok(ClientHello {
        client_version,
        random,
        session_id,
        cipher_suites,
        compression_methods,
        extensions,
    })
}

/// Parses a ServerHello body. Same conventions as [`parse_client_hello`].
pub fn parse_server_hello(body: &[u8]) -> Result<ServerHello> {
    let mut cursor = Cursor::new(body);

    let server_version = cursor.read_u16()?;
    let random = cursor.read_array::<32>()?;
    let session_id = cursor.read_vec8()?.to_vec();
    if session_id.len() > 32 {
        return Err(TlsError::BadFormat(format!(
            "session_id length {} exceeds 32",
            session_id.len()
        )));
    }
    let cipher_suite = cursor.read_u16()?;
    let compression_method = cursor.read_u8()?;
    let extensions = cursor.read_vec16()?.to_vec();
    if !cursor.is_empty() {
        return Err(TlsError::BadFormat(format!(
            "{} trailing bytes after extensions",
            cursor.remaining()
        )));
    }

    Ok(ServerHello {
        server_version,
        random,
        session_id,
        cipher_suite,
        compression_method,
        extensions,
    })
}

/// Strips the 4-byte handshake header, checking the message type.
fn hello_body<'a>(record: &'a TlsRecord, msg_type: u8) -> Result<&'a [u8]> {
    if record.content_type != ContentType::Handshake {
        return Err(TlsError::BadFormat(format!(
            "expected a handshake record, got {}",
            record.content_type
        )));
    }
    let mut cursor = Cursor::new(&record.payload);
    let found = cursor.read_u8()?;
    if found != msg_type {
        return Err(TlsError::BadFormat(format!(
            "unexpected handshake message type 0x{found:02x}"
        )));
    }
    cursor.read_vec24()
}

pub fn client_hello_from_record(record: &TlsRecord) -> Result<ClientHello> {
    parse_client_hello(hello_body(record, MSG_CLIENT_HELLO)?)
}

pub fn server_hello_from_record(record: &TlsRecord) -> Result<ServerHello> {
    parse_server_hello(hello_body(record, MSG_SERVER_HELLO)?)
}

/// Parses a ClientHello from a TCP payload with the record header still
/// attached. The first ClientHello record in the payload wins.
pub fn client_hello_from_payload(payload: &[u8]) -> Result<ClientHello> {
    let (records, _) = split_records(payload)?;
    let record = records
        .iter()
        .find(|record| is_client_hello(record))
        .ok_or_else(|| TlsError::BadFormat("no ClientHello record in payload".to_string()))?;
    client_hello_from_record(record)
}

/// Finds the first extension with the given type in an extensions blob.
///
/// The blob is the sequence of `{u16 type, u16 length, data}` entries as it
/// appears inside a hello (without the outer extensions length, which the
/// hello parsers already strip).
pub fn find_extension(extensions: &[u8], ext_type: u16) -> Result<Option<&[u8]>> {
    let mut cursor = Cursor::new(extensions);
    while !cursor.is_empty() {
        let found = cursor.read_u16()?;
        let data = cursor.read_vec16()?;
        if found == ext_type {
            return Ok(Some(data));
        }
    }
    Ok(None)
}

/// Extracts the server name from a ClientHello.
///
/// Returns the first host_name entry of the server_name extension. Fails
/// with [`TlsError::NoSni`] when the extension or the entry is absent or
/// empty.
pub fn get_sni(hello: &ClientHello) -> Result<String> {
    let data =
        find_extension(&hello.extensions, extension::SERVER_NAME)?.ok_or(TlsError::NoSni)?;

    let mut cursor = Cursor::new(data);
    let list = cursor.read_vec16()?;
    let mut entries = Cursor::new(list);
    while !entries.is_empty() {
        let name_type = entries.read_u8()?;
        let name = entries.read_vec16()?;
        if name_type != 0 {
            continue;
        }
        if name.is_empty() {
            return Err(TlsError::NoSni);
        }
        return String::from_utf8(name.to_vec())
            .map_err(|_| TlsError::BadFormat("server name is not valid UTF-8".to_string()));
    }
    Err(TlsError::NoSni)
}

/// True when the ClientHello names exactly `host`.
pub fn has_sni(hello: &ClientHello, host: &str) -> Result<bool> {
    Ok(get_sni(hello)? == host)
}

/// True when the ClientHello's server name contains `host` as a substring.
pub fn sni_contains(hello: &ClientHello, host: &str) -> Result<bool> {
    Ok(get_sni(hello)?.contains(host))
}

/// Versions offered in the ClientHello's supported_versions extension.
///
/// Empty when the extension is absent, which means the legacy version field
/// is authoritative (TLS 1.2 or older).
pub fn get_supported_versions(hello: &ClientHello) -> Result<Vec<u16>> {
    let Some(data) = find_extension(&hello.extensions, extension::SUPPORTED_VERSIONS)? else {
        return Ok(Vec::new());
    };
    let mut cursor = Cursor::new(data);
    let list = cursor.read_vec8()?;
    if list.len() % 2 != 0 {
        return Err(TlsError::BadFormat(
            "odd supported_versions length".to_string(),
        ));
    }
    Ok(list
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}

/// The protocol version the server actually selected.
///
/// TLS 1.3 keeps the legacy field at 0x0303 and carries the real version in
/// the supported_versions extension; without the extension the legacy field
/// is the answer.
pub fn negotiated_version(hello: &ServerHello) -> Result<u16> {
    match find_extension(&hello.extensions, extension::SUPPORTED_VERSIONS)? {
        Some(data) if data.len() == 2 => Ok(u16::from_be_bytes([data[0], data[1]])),
        Some(data) => Err(TlsError::BadFormat(format!(
            "supported_versions in ServerHello has length {}",
            data.len()
        ))),
        None => Ok(hello.server_version),
    }
}

/// Pulls the first certificate out of a decrypted handshake flight.
///
/// Walks the handshake messages until a Certificate message is found and
/// returns the DER bytes of its leading entry.
pub fn extract_certificate(handshake_payload: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(handshake_payload);
    while !cursor.is_empty() {
        let msg_type = cursor.read_u8()?;
        let body = cursor.read_vec24()?;
        if msg_type != MSG_CERTIFICATE {
            continue;
        }
        let mut msg = Cursor::new(body);
        let _request_context = msg.read_vec8()?;
        let list = msg.read_vec24()?;
        if list.is_empty() {
            return Err(TlsError::BadFormat("empty certificate list".to_string()));
        }
        let mut entries = Cursor::new(list);
        let der = entries.read_vec24()?;
        return Ok(der.to_vec());
    }
    Err(TlsError::BadFormat(
        "no Certificate message in handshake payload".to_string(),
    ))
}

pub fn client_random_to_hex(random: &[u8; 32]) -> String {
    hex::encode(random)
}

pub fn session_id_to_hex(session_id: &[u8]) -> String {
    hex::encode(session_id)
}
