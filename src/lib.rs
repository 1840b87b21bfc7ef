//! Passive TLS 1.2/1.3 dissection and decryption.
//!
//! Given reassembled TCP payload streams and an out-of-band key-log file
//! (NSS `SSLKEYLOGFILE` format), this crate segments the byte stream into
//! TLS records, recovers the session parameters from the Hello exchange,
//! derives per-direction AEAD keys with HKDF-Expand-Label, and decrypts
//! handshake and application records. TLS 1.2 sessions are detected but not
//! decrypted.
//!
//! Capture, TCP reassembly and direction splitting happen outside this
//! crate: the decryptor expects one direction's records in wire order.
//!
//! ```no_run
//! use tls_dissect::{
//!     decrypt_stream, split_records, SecretLabel, SecretLog, TlsSessionParams,
//! };
//!
//! # let (client_random, server_random, stream_bytes) = ([0u8; 32], [0u8; 32], Vec::<u8>::new());
//! let secrets = SecretLog::from_file("/tmp/sslkeylog.txt").expect("readable key log");
//! let (records, _consumed) = split_records(&stream_bytes).expect("TLS framing");
//!
//! let params = TlsSessionParams {
//!     client_random,
//!     server_random,
//!     tls_version: 0x0304,
//!     cipher_suite: 0x1301,
//! };
//! for outcome in decrypt_stream(&params, &records, &secrets, SecretLabel::ServerTrafficSecret0) {
//!     match outcome {
//!         Ok(record) => println!("{}: {} bytes", record.content_type, record.payload.len()),
//!         Err(e) => eprintln!("undecryptable record: {e}"),
//!     }
//! }
//! ```

pub mod decrypt;
pub mod error;
pub mod handshake;
pub mod keylog;
pub mod record;
pub mod schedule;
pub mod session;
pub mod wire;

pub use decrypt::{
    build_aad, build_nonce, decrypt_record, decrypt_stream, TlsSessionParams, AEAD_TAG_LEN,
};
pub use error::{Result, TlsError};
pub use handshake::{
    client_hello_from_payload, client_hello_from_record, client_random_to_hex,
    extract_certificate, find_extension, get_sni, get_supported_versions, has_sni,
    negotiated_version, parse_client_hello, parse_server_hello, server_hello_from_record,
    session_id_to_hex, sni_contains, ClientHello, ServerHello,
};
pub use keylog::{SecretLabel, SecretLog, SharedSecretLog, SECRET_LABELS};
pub use record::{
    extract_records, is_alert, is_application_data, is_client_hello, is_server_hello,
    is_tls_payload, split_records, ContentType, RecordExtraction, TlsRecord, MAX_PLAINTEXT_LEN,
    MAX_RECORD_LEN, TLS12, TLS13,
};
pub use schedule::{derive_key_iv, hkdf_expand_label, CipherSuite, TlsKeyMaterial};
pub use session::{
    client_hello_from_ethernet, get_sni_to_ip, record_from_ethernet, tcp_payload_from_ethernet,
    SniToIp,
};
