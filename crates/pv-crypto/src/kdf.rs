//! Key derivation: PBKDF2-HMAC passphrase → 256-bit key

use pbkdf2::pbkdf2_hmac;
use pv_core::HashAlgorithm;
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use zeroize::{Zeroize, Zeroizing};

use crate::KEY_SIZE;

/// A 256-bit key derived from a passphrase via PBKDF2.
///
/// Zeroized on drop to prevent secrets lingering in memory.
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Lowercase hex form. Legacy writers fed this string, not the raw
    /// bytes, to the passphrase-mode cipher.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.bytes))
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 256-bit key with PBKDF2-HMAC over the selected hash.
///
/// `salt` is used verbatim; recovery passes the UTF-8 bytes of a hex string.
pub fn derive_key(
    passphrase: &SecretString,
    salt: &[u8],
    iterations: u32,
    hash: HashAlgorithm,
) -> anyhow::Result<DerivedKey> {
    if iterations == 0 {
        anyhow::bail!("PBKDF2 iteration count must be at least 1");
    }

    let password = passphrase.expose_secret().as_bytes();
    let mut key = [0u8; KEY_SIZE];
    match hash {
        HashAlgorithm::Sha1 => pbkdf2_hmac::<Sha1>(password, salt, iterations, &mut key),
        HashAlgorithm::Sha256 => pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key),
        HashAlgorithm::Sha512 => pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut key),
    }

    Ok(DerivedKey::from_bytes(key))
}
