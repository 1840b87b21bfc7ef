//! SSLKEYLOGFILE parsing.
//!
//! Key-log files are line oriented:
//!
//! ```text
//! <LABEL> <64 hex chars: client_random> <hex: secret>
//! ```
//!
//! Lines starting with `#`, lines with the wrong field count, unknown
//! labels and undecodable hex are skipped rather than failing the load;
//! applications append to these files while capture is running and a torn
//! final line is normal.

use crate::error::{Result, TlsError};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Labels recognized in NSS key-log files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretLabel {
    ClientHandshakeTrafficSecret,
    ServerHandshakeTrafficSecret,
    ClientTrafficSecret0,
    ServerTrafficSecret0,
    ExporterSecret,
}

/// All labels a fully decryptable session carries.
pub const SECRET_LABELS: [SecretLabel; 5] = [
    SecretLabel::ClientHandshakeTrafficSecret,
    SecretLabel::ServerHandshakeTrafficSecret,
    SecretLabel::ClientTrafficSecret0,
    SecretLabel::ServerTrafficSecret0,
    SecretLabel::ExporterSecret,
];

impl SecretLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretLabel::ClientHandshakeTrafficSecret => "CLIENT_HANDSHAKE_TRAFFIC_SECRET",
            SecretLabel::ServerHandshakeTrafficSecret => "SERVER_HANDSHAKE_TRAFFIC_SECRET",
            SecretLabel::ClientTrafficSecret0 => "CLIENT_TRAFFIC_SECRET_0",
            SecretLabel::ServerTrafficSecret0 => "SERVER_TRAFFIC_SECRET_0",
            SecretLabel::ExporterSecret => "EXPORTER_SECRET",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "CLIENT_HANDSHAKE_TRAFFIC_SECRET" => Some(SecretLabel::ClientHandshakeTrafficSecret),
            "SERVER_HANDSHAKE_TRAFFIC_SECRET" => Some(SecretLabel::ServerHandshakeTrafficSecret),
            "CLIENT_TRAFFIC_SECRET_0" => Some(SecretLabel::ClientTrafficSecret0),
            "SERVER_TRAFFIC_SECRET_0" => Some(SecretLabel::ServerTrafficSecret0),
            "EXPORTER_SECRET" => Some(SecretLabel::ExporterSecret),
            _ => None,
        }
    }
}

impl fmt::Display for SecretLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traffic secrets indexed by client random, then label.
///
/// Client randoms are stored as lowercase hex strings; lookups hex-encode
/// the caller's 32-byte random, so file casing never matters.
#[derive(Debug, Clone, Default)]
pub struct SecretLog {
    sessions: HashMap<String, HashMap<SecretLabel, Vec<u8>>>,
}

impl SecretLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a key-log file.
    ///
    /// ```no_run
    /// use tls_dissect::keylog::SecretLog;
    ///
    /// let log = SecretLog::from_file("/tmp/sslkeylog.txt").expect("readable key log");
    /// println!("{} sessions", log.session_count());
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| TlsError::BadFormat(format!("failed to read key-log file: {e}")))?;
        Ok(Self::from_string(&content))
    }

    /// Loads a key-log file keeping only one session's secrets.
    pub fn from_file_for<P: AsRef<Path>>(path: P, client_random: &[u8; 32]) -> Result<Self> {
        let mut log = Self::from_file(path)?;
        let wanted = hex::encode(client_random);
        log.sessions.retain(|random, _| *random == wanted);
        Ok(log)
    }

    /// Parses key-log content. Malformed lines are skipped, never fatal.
    pub fn from_string(content: &str) -> Self {
        let mut log = Self::new();
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if !log.insert_line(line) {
                debug!("skipped key-log line {}", line_num + 1);
            }
        }
        log
    }

    /// Parses one `LABEL client_random secret` line. Returns false when the
    /// line does not contribute an entry.
    fn insert_line(&mut self, line: &str) -> bool {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return false;
        }
        let Some(label) = SecretLabel::from_label(parts[0]) else {
            return false;
        };
        if parts[1].len() != 64 {
            return false;
        }
        let Ok(random) = hex::decode(parts[1]) else {
            return false;
        };
        let Ok(secret) = hex::decode(parts[2]) else {
            return false;
        };
        // SHA-256 or SHA-384 output.
        if secret.len() != 32 && secret.len() != 48 {
            return false;
        }

        self.sessions
            .entry(hex::encode(random))
            .or_default()
            .insert(label, secret);
        true
    }

    /// Looks up the secret for a (client_random, label) pair.
    pub fn traffic_secret(&self, client_random: &[u8; 32], label: SecretLabel) -> Result<&[u8]> {
        self.sessions
            .get(&hex::encode(client_random))
            .and_then(|session| session.get(&label))
            .map(Vec::as_slice)
            .ok_or_else(|| TlsError::MissingSecret(label.as_str().to_string()))
    }

    /// True when all five labels are present for this session, i.e. both
    /// handshake and application traffic can be decrypted.
    pub fn is_complete(&self, client_random: &[u8; 32]) -> bool {
        match self.sessions.get(&hex::encode(client_random)) {
            Some(session) => SECRET_LABELS.iter().all(|label| session.contains_key(label)),
            None => false,
        }
    }

    /// Number of distinct client randoms.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Total number of stored secrets.
    pub fn secret_count(&self) -> usize {
        self.sessions.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Snapshot holder for workers sharing one secret log.
///
/// Session workers clone the current `Arc` and keep reading their snapshot;
/// a reload swaps the `Arc` under the write lock, so readers observe either
/// the old or the new log, never a torn mix.
#[derive(Debug, Default)]
pub struct SharedSecretLog {
    inner: RwLock<Arc<SecretLog>>,
}

impl SharedSecretLog {
    pub fn new(log: SecretLog) -> Self {
        Self {
            inner: RwLock::new(Arc::new(log)),
        }
    }

    pub fn snapshot(&self) -> Arc<SecretLog> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn replace(&self, log: SecretLog) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANDOM_A: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
    const SECRET_32: &str = "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210";

    fn random_a() -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hex::decode(RANDOM_A).unwrap());
        out
    }

    #[test]
    fn test_parse_single_line() {
        let log = SecretLog::from_string(&format!(
            "CLIENT_HANDSHAKE_TRAFFIC_SECRET {RANDOM_A} {SECRET_32}"
        ));

        assert_eq!(log.session_count(), 1);
        assert_eq!(log.secret_count(), 1);
        let secret = log
            .traffic_secret(&random_a(), SecretLabel::ClientHandshakeTrafficSecret)
            .unwrap();
        assert_eq!(secret.len(), 32);
    }

    #[test]
    fn test_skip_comments_and_short_lines() {
        let content = format!(
            "# comment\n\
             CLIENT_HANDSHAKE_TRAFFIC_SECRET {RANDOM_A} {SECRET_32}\n\
             SERVER_TRAFFIC_SECRET_0 {RANDOM_A}\n"
        );
        let log = SecretLog::from_string(&content);

        assert_eq!(log.secret_count(), 1);
        assert!(matches!(
            log.traffic_secret(&random_a(), SecretLabel::ServerTrafficSecret0),
            Err(TlsError::MissingSecret(_))
        ));
    }

    #[test]
    fn test_skip_unknown_label() {
        let log = SecretLog::from_string(&format!("CLIENT_RANDOM {RANDOM_A} {SECRET_32}"));
        assert!(log.is_empty());
    }

    #[test]
    fn test_skip_bad_hex_and_bad_lengths() {
        let content = format!(
            "CLIENT_TRAFFIC_SECRET_0 {} {SECRET_32}\n\
             CLIENT_TRAFFIC_SECRET_0 {RANDOM_A} zz{SECRET_32}\n\
             CLIENT_TRAFFIC_SECRET_0 {RANDOM_A} abcd\n",
            &RANDOM_A[..62],
        );
        let log = SecretLog::from_string(&content);
        assert!(log.is_empty());
    }

    #[test]
    fn test_uppercase_hex_is_normalized() {
        let upper = RANDOM_A.to_uppercase();
        let log = SecretLog::from_string(&format!(
            "SERVER_HANDSHAKE_TRAFFIC_SECRET {upper} {SECRET_32}"
        ));

        assert!(log
            .traffic_secret(&random_a(), SecretLabel::ServerHandshakeTrafficSecret)
            .is_ok());
    }

    #[test]
    fn test_last_writer_wins() {
        let other = "00".repeat(31) + "aa";
        let content = format!(
            "CLIENT_TRAFFIC_SECRET_0 {RANDOM_A} {SECRET_32}\n\
             CLIENT_TRAFFIC_SECRET_0 {RANDOM_A} {other}\n"
        );
        let log = SecretLog::from_string(&content);

        assert_eq!(log.secret_count(), 1);
        let secret = log
            .traffic_secret(&random_a(), SecretLabel::ClientTrafficSecret0)
            .unwrap();
        assert_eq!(secret, hex::decode(&other).unwrap().as_slice());
    }

    #[test]
    fn test_is_complete() {
        let mut content = String::new();
        for label in &SECRET_LABELS[..4] {
            content.push_str(&format!("{label} {RANDOM_A} {SECRET_32}\n"));
        }
        let log = SecretLog::from_string(&content);
        assert!(!log.is_complete(&random_a()));

        content.push_str(&format!("EXPORTER_SECRET {RANDOM_A} {SECRET_32}\n"));
        let log = SecretLog::from_string(&content);
        assert!(log.is_complete(&random_a()));
    }

    #[test]
    fn test_shared_snapshot_swap() {
        let shared = SharedSecretLog::new(SecretLog::new());
        let before = shared.snapshot();

        shared.replace(SecretLog::from_string(&format!(
            "CLIENT_TRAFFIC_SECRET_0 {RANDOM_A} {SECRET_32}"
        )));

        assert!(before.is_empty());
        assert_eq!(shared.snapshot().secret_count(), 1);
    }
}
