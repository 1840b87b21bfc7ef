//! TLS 1.3 record decryption.
//!
//! One direction of traffic is decrypted under one traffic secret: the
//! caller picks the label for the phase (handshake vs application) and the
//! direction, feeds records in wire order, and gets per-record outcomes
//! back. Key and IV are derived from the key log on demand; nothing is
//! cached between calls.

use crate::error::{Result, TlsError};
use crate::keylog::{SecretLabel, SecretLog};
use crate::record::{ContentType, TlsRecord, TLS12, TLS13};
use crate::schedule::{derive_key_iv, CipherSuite};
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, KeyInit, Nonce};
use tracing::warn;

/// AES-GCM authentication tag length.
pub const AEAD_TAG_LEN: usize = 16;

/// Negotiated parameters for one TLS session, recovered from the Hello
/// exchange.
///
/// `tls_version` is the *negotiated* version: 0x0304 once the ServerHello's
/// supported_versions extension selected TLS 1.3, the legacy field
/// otherwise. `server_random` is carried for completeness; the TLS 1.3
/// schedule keys purely off client_random.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSessionParams {
    pub client_random: [u8; 32],
    pub server_random: [u8; 32],
    pub tls_version: u16,
    /// Cipher suite identifier from the ServerHello.
    pub cipher_suite: u16,
}

/// Per-record nonce (RFC 8446 §5.3): the 64-bit sequence number, left-padded
/// with zeros, XORed into the base IV.
pub fn build_nonce(base_iv: &[u8], seq_num: u64) -> Result<[u8; 12]> {
    if base_iv.len() != 12 {
        return Err(TlsError::BadFormat(format!(
            "base IV length {} is not 12",
            base_iv.len()
        )));
    }
    let mut nonce = [0u8; 12];
    nonce.copy_from_slice(base_iv);
    for (nonce_byte, seq_byte) in nonce[4..].iter_mut().zip(seq_num.to_be_bytes()) {
        *nonce_byte ^= seq_byte;
    }
    Ok(nonce)
}

/// Additional authenticated data: the 5-byte record header as transmitted.
pub fn build_aad(content_type: ContentType, version: u16, length: u16) -> [u8; 5] {
    let version = version.to_be_bytes();
    let length = length.to_be_bytes();
    [
        content_type as u8,
        version[0],
        version[1],
        length[0],
        length[1],
    ]
}

/// Decrypts a single record under the given label and sequence number.
///
/// Only negotiated TLS 1.3 sessions are handled; a TLS 1.2 session is
/// detected and refused rather than mis-decrypted. The returned record
/// carries the inner content type with the zero padding stripped.
pub fn decrypt_record(
    params: &TlsSessionParams,
    record: &TlsRecord,
    secrets: &SecretLog,
    label: SecretLabel,
    seq_num: u64,
) -> Result<TlsRecord> {
    if params.tls_version != TLS13 {
        return Err(TlsError::Unsupported(format!(
            "decryption requires a negotiated TLS 1.3 session, got version 0x{:04x}",
            params.tls_version
        )));
    }
    let suite = CipherSuite::from_u16(params.cipher_suite).ok_or_else(|| {
        TlsError::Unsupported(format!("cipher suite 0x{:04x}", params.cipher_suite))
    })?;

    // Ciphertext must hold the tag plus at least the inner content type.
    if record.payload.len() <= AEAD_TAG_LEN {
        return Err(TlsError::BadFormat(
            "ciphertext shorter than AEAD tag".to_string(),
        ));
    }

    let secret = secrets.traffic_secret(&params.client_random, label)?;
    let material = derive_key_iv(secret, suite)?;
    let nonce = build_nonce(&material.iv, seq_num)?;
    let aad = build_aad(
        ContentType::ApplicationData,
        TLS12,
        record.payload.len() as u16,
    );

    let plaintext = open(suite, &material.key, &nonce, &aad, &record.payload)?;
    let (content_type, payload) = strip_inner_plaintext(&plaintext)?;

    Ok(TlsRecord::new(content_type, TLS12, payload))
}

/// Decrypts one direction's records in wire order.
///
/// Returns one outcome per input record, index-aligned, so a single
/// undecryptable record never hides the rest of the session. Records that
/// are not ApplicationData (ChangeCipherSpec in particular) pass through
/// unchanged and do not advance the sequence number; every ApplicationData
/// record advances it by exactly one, decrypted or not.
pub fn decrypt_stream(
    params: &TlsSessionParams,
    records: &[TlsRecord],
    secrets: &SecretLog,
    label: SecretLabel,
) -> Vec<Result<TlsRecord>> {
    let mut seq_num: u64 = 0;
    let mut outcomes = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        if record.content_type != ContentType::ApplicationData {
            outcomes.push(Ok(record.clone()));
            continue;
        }

        let outcome = decrypt_record(params, record, secrets, label, seq_num);
        if let Err(ref e) = outcome {
            warn!("failed to decrypt record {index} under {label}: {e}");
        }
        seq_num = seq_num.saturating_add(1);
        outcomes.push(outcome);
    }

    outcomes
}

fn open(
    suite: CipherSuite,
    key: &[u8],
    nonce_bytes: &[u8; 12],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    let nonce = Nonce::from_slice(nonce_bytes);
    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    let plaintext = match suite {
        CipherSuite::Aes128GcmSha256 => Aes128Gcm::new_from_slice(key)
            .map_err(|_| TlsError::BadFormat("bad AES-128 key length".to_string()))?
            .decrypt(nonce, payload),
        CipherSuite::Aes256GcmSha384 => Aes256Gcm::new_from_slice(key)
            .map_err(|_| TlsError::BadFormat("bad AES-256 key length".to_string()))?
            .decrypt(nonce, payload),
    };

    plaintext.map_err(|_| TlsError::AeadFailure)
}

/// Splits TLSInnerPlaintext into content type and payload (RFC 8446 §5.4):
/// zero padding runs to the end, the byte before it is the true content
/// type, everything before that is the payload.
fn strip_inner_plaintext(plaintext: &[u8]) -> Result<(ContentType, Vec<u8>)> {
    let type_pos = plaintext
        .iter()
        .rposition(|&byte| byte != 0)
        .ok_or_else(|| TlsError::BadFormat("inner plaintext is all padding".to_string()))?;

    let content_type = ContentType::from_u8(plaintext[type_pos]).ok_or_else(|| {
        TlsError::BadFormat(format!(
            "unknown inner content type 0x{:02x}",
            plaintext[type_pos]
        ))
    })?;

    Ok((content_type, plaintext[..type_pos].to_vec()))
}
