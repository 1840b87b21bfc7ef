//! Traffic-secret expansion (RFC 8446 §7.1 / §7.3).
//!
//! The key log hands us traffic secrets; everything per-record is derived
//! from them with HKDF-Expand-Label under the cipher suite's hash.

use crate::error::{Result, TlsError};
use hkdf::Hkdf;
use sha2::{Sha256, Sha384};
use std::fmt;

/// AEAD cipher suites this crate derives keys for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherSuite {
    /// TLS_AES_128_GCM_SHA256 (0x1301)
    Aes128GcmSha256,
    /// TLS_AES_256_GCM_SHA384 (0x1302)
    Aes256GcmSha384,
}

impl CipherSuite {
    pub fn from_u16(id: u16) -> Option<Self> {
        match id {
            0x1301 => Some(Self::Aes128GcmSha256),
            0x1302 => Some(Self::Aes256GcmSha384),
            _ => None,
        }
    }

    pub fn id(&self) -> u16 {
        match self {
            Self::Aes128GcmSha256 => 0x1301,
            Self::Aes256GcmSha384 => 0x1302,
        }
    }

    /// AEAD key length in bytes.
    pub fn key_len(&self) -> usize {
        match self {
            Self::Aes128GcmSha256 => 16,
            Self::Aes256GcmSha384 => 32,
        }
    }

    /// AEAD IV length in bytes, 12 for both GCM suites.
    pub fn iv_len(&self) -> usize {
        12
    }

    /// Output length of the suite's hash, which is also the expected
    /// traffic-secret length.
    pub fn hash_len(&self) -> usize {
        match self {
            Self::Aes128GcmSha256 => 32,
            Self::Aes256GcmSha384 => 48,
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aes128GcmSha256 => write!(f, "TLS_AES_128_GCM_SHA256"),
            Self::Aes256GcmSha384 => write!(f, "TLS_AES_256_GCM_SHA384"),
        }
    }
}

/// A derived (key, iv) pair for one direction of traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsKeyMaterial {
    pub key: Vec<u8>,
    pub iv: Vec<u8>,
}

/// HKDF-Expand-Label.
///
/// Builds the HkdfLabel info structure
///
/// ```text
/// struct {
///     uint16 length = Length;
///     opaque label<7..255> = "tls13 " + Label;
///     opaque context<0..255> = Context;
/// } HkdfLabel;
/// ```
///
/// and runs HKDF-Expand under the suite's hash.
pub fn hkdf_expand_label(
    secret: &[u8],
    label: &str,
    context: &[u8],
    length: usize,
    suite: CipherSuite,
) -> Result<Vec<u8>> {
    let full_label = format!("tls13 {label}");
    if full_label.len() > 255 || context.len() > 255 {
        return Err(TlsError::BadFormat(
            "HkdfLabel field exceeds 255 bytes".to_string(),
        ));
    }

    let mut info = Vec::with_capacity(4 + full_label.len() + context.len());
    info.extend_from_slice(&(length as u16).to_be_bytes());
    info.push(full_label.len() as u8);
    info.extend_from_slice(full_label.as_bytes());
    info.push(context.len() as u8);
    info.extend_from_slice(context);

    let mut okm = vec![0u8; length];
    let expanded = match suite {
        CipherSuite::Aes128GcmSha256 => Hkdf::<Sha256>::from_prk(secret)
            .map_err(|_| {
                TlsError::Unsupported("traffic secret shorter than SHA-256 output".to_string())
            })
            .and_then(|hkdf| {
                hkdf.expand(&info, &mut okm)
                    .map_err(|_| TlsError::BadFormat("HKDF-Expand length invalid".to_string()))
            }),
        CipherSuite::Aes256GcmSha384 => Hkdf::<Sha384>::from_prk(secret)
            .map_err(|_| {
                TlsError::Unsupported("traffic secret shorter than SHA-384 output".to_string())
            })
            .and_then(|hkdf| {
                hkdf.expand(&info, &mut okm)
                    .map_err(|_| TlsError::BadFormat("HKDF-Expand length invalid".to_string()))
            }),
    };
    expanded?;

    Ok(okm)
}

/// Derives the per-direction AEAD key and IV from a traffic secret.
///
/// Pure function: the same secret and suite always produce the same
/// material, bit for bit.
pub fn derive_key_iv(secret: &[u8], suite: CipherSuite) -> Result<TlsKeyMaterial> {
    Ok(TlsKeyMaterial {
        key: hkdf_expand_label(secret, "key", &[], suite.key_len(), suite)?,
        iv: hkdf_expand_label(secret, "iv", &[], suite.iv_len(), suite)?,
    })
}
