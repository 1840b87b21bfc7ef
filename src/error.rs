use thiserror::Error;

/// Errors produced while dissecting or decrypting TLS traffic.
///
/// Messages carry one-line context (record index, label name) and never
/// include secret material.
#[derive(Error, Debug)]
pub enum TlsError {
    /// Input ended in the middle of a field.
    #[error("truncated input")]
    Truncated,

    /// A length prefix or tag byte is inconsistent with the surrounding data.
    #[error("bad format: {0}")]
    BadFormat(String),

    /// Record content type outside the TLS range (0x14..0x17).
    #[error("bad record content type: 0x{0:02x}")]
    BadContentType(u8),

    /// Record length field exceeds the TLS maximum.
    #[error("record length {0} exceeds TLS maximum")]
    BadLength(usize),

    /// The server_name extension is absent or empty.
    #[error("no server name indication")]
    NoSni,

    /// The key log has no entry for this (client_random, label) pair.
    #[error("missing secret for label {0}")]
    MissingSecret(String),

    /// Cipher suite or protocol version this crate does not handle.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// AEAD authentication tag verification failed.
    #[error("AEAD authentication failed")]
    AeadFailure,
}

/// Convenience Result type for TLS operations
pub type Result<T> = std::result::Result<T, TlsError>;
