//! Admin passkey handling.
//!
//! The stored credential is obfuscated with [`encode`] and recovered with
//! [`decode`]. This is plain standard base64 of the UTF-8 bytes.
//!
//! # Security
//!
//! The obfuscation is reversible and deterministic. It only keeps the passkey
//! from appearing verbatim in the session store. Anyone who can read the
//! store can recover the passkey, so it is NOT an access-control boundary.

use base64::engine::general_purpose;
use base64::Engine;
use zeroize::Zeroizing;

/// Errors while recovering a stored credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("Stored credential is not valid base64")]
    Malformed,

    #[error("Stored credential is not valid UTF-8")]
    NotUtf8,
}

/// A raw, user-entered passkey.
///
/// The buffer is wiped on drop and never printed by `Debug`.
#[derive(Clone)]
pub struct PassKey(Zeroizing<String>);

impl PassKey {
    /// Wrap a raw passkey.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Borrow the raw passkey text.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Exact string comparison against a candidate.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.expose() == candidate
    }
}

impl std::fmt::Debug for PassKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PassKey").field(&"***").finish()
    }
}

/// Obfuscate a credential for storage.
#[must_use]
pub fn encode(raw: &str) -> String {
    general_purpose::STANDARD.encode(raw.as_bytes())
}

/// Recover a credential previously produced by [`encode`].
///
/// # Errors
/// Returns error if the stored value was not produced by `encode`.
pub fn decode(stored: &str) -> Result<PassKey, CredentialError> {
    let bytes = Zeroizing::new(
        general_purpose::STANDARD
            .decode(stored.trim())
            .map_err(|_| CredentialError::Malformed)?,
    );
    let text = std::str::from_utf8(&bytes).map_err(|_| CredentialError::NotUtf8)?;
    Ok(PassKey::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_is_not_plaintext() {
        let stored = encode("1234");
        assert_ne!(stored, "1234");
        assert_eq!(stored, "MTIzNA==");
    }

    #[test]
    fn test_encode_is_deterministic() {
        assert_eq!(encode("482913"), encode("482913"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode("not base64!").unwrap_err(), CredentialError::Malformed);
        // 0xff 0xfe is valid base64 input but not UTF-8
        assert_eq!(decode("//4=").unwrap_err(), CredentialError::NotUtf8);
    }

    #[test]
    fn test_passkey_debug_no_leak() {
        let key = PassKey::new("123456");
        let debug_output = format!("{key:?}");
        assert!(!debug_output.contains("123456"));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(raw in ".{0,64}") {
            let stored = encode(&raw);
            let recovered = decode(&stored).expect("round trip");
            prop_assert_eq!(recovered.expose(), raw.as_str());
        }
    }
}
