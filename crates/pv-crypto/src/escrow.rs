//! Canonical escrow envelope
//!
//! Once a phrase has been recovered by search it is re-sealed under the
//! process-wide escrow key so later reads cost one derivation:
//! ```text
//! pv1$<salt: 32 hex chars>$<passphrase-mode envelope>
//! key = hex(PBKDF2-HMAC-SHA256(escrow_key, salt_hex, 10_000, 32))
//! ```
//! Both the PBKDF2 salt and the envelope salt are fresh per call.

use pv_core::HashAlgorithm;
use rand::RngCore;
use secrecy::SecretString;
use zeroize::{Zeroize, Zeroizing};

use crate::kdf::derive_key;
use crate::passphrase::{decrypt_with_passphrase, encrypt_with_passphrase};

/// Version tag of the escrow envelope
pub const ESCROW_VERSION: &str = "pv1";

/// Fixed PBKDF2 iteration count of the escrow scheme
pub const ESCROW_ITERATIONS: u32 = 10_000;

/// Fixed PBKDF2 hash of the escrow scheme
pub const ESCROW_HASH: HashAlgorithm = HashAlgorithm::Sha256;

const ESCROW_SALT_SIZE: usize = 16;

/// The operator-held escrow key. Loaded once at startup, never derived.
pub struct EscrowKey {
    secret: SecretString,
}

impl EscrowKey {
    /// Wrap a key loaded from a secret store. Surrounding whitespace is
    /// stripped (key files usually end in a newline); an empty key is refused.
    pub fn new(raw: &str) -> anyhow::Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            anyhow::bail!("escrow key is empty");
        }
        Ok(Self {
            secret: SecretString::from(trimmed.to_string()),
        })
    }
}

impl std::fmt::Debug for EscrowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscrowKey")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Returns true if `stored` looks like an escrow envelope (cheap prefix check).
pub fn is_escrow_envelope(stored: &str) -> bool {
    stored
        .trim()
        .strip_prefix(ESCROW_VERSION)
        .is_some_and(|rest| rest.starts_with('$'))
}

/// Seal a recovered phrase under the escrow key.
pub fn seal_escrow(key: &EscrowKey, plaintext: &str) -> anyhow::Result<String> {
    let mut salt = [0u8; ESCROW_SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt_hex = hex::encode(salt);

    let derived = derive_key(&key.secret, salt_hex.as_bytes(), ESCROW_ITERATIONS, ESCROW_HASH)?;
    let envelope = encrypt_with_passphrase(derived.to_hex().as_bytes(), plaintext.as_bytes())?;

    Ok(format!("{ESCROW_VERSION}${salt_hex}${envelope}"))
}

/// Open an escrow envelope produced by [`seal_escrow`].
pub fn open_escrow(key: &EscrowKey, sealed: &str) -> anyhow::Result<Zeroizing<String>> {
    let mut parts = sealed.trim().splitn(3, '$');
    let (version, salt_hex, envelope) = match (parts.next(), parts.next(), parts.next()) {
        (Some(v), Some(s), Some(e)) => (v, s, e),
        _ => anyhow::bail!("malformed escrow envelope: expected version$salt$data"),
    };

    if version != ESCROW_VERSION {
        anyhow::bail!("unsupported escrow envelope version: {version:?}");
    }
    if salt_hex.len() != ESCROW_SALT_SIZE * 2 || hex::decode(salt_hex).is_err() {
        anyhow::bail!("escrow salt must be {} hex characters", ESCROW_SALT_SIZE * 2);
    }

    let derived = derive_key(&key.secret, salt_hex.as_bytes(), ESCROW_ITERATIONS, ESCROW_HASH)?;
    let mut plaintext = decrypt_with_passphrase(derived.to_hex().as_bytes(), envelope)
        .map_err(|e| anyhow::anyhow!("escrow decryption failed: {e}"))?;

    match String::from_utf8(std::mem::take(&mut *plaintext)) {
        Ok(text) => Ok(Zeroizing::new(text)),
        Err(e) => {
            e.into_bytes().zeroize();
            anyhow::bail!("escrow plaintext is not UTF-8")
        }
    }
}
