//! Per-attempt key material.

use pv_core::HashAlgorithm;
use pv_crypto::{derive_key, DerivedKey};
use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::passphrases::PassphraseCandidate;

/// Inputs to one PBKDF2 derivation.
///
/// Built inside a single search attempt and dropped when that attempt ends;
/// passphrase and salt copies are zeroized on drop.
pub struct CandidateKeyMaterial {
    passphrase: SecretString,
    salt: Zeroizing<Vec<u8>>,
    iterations: u32,
    hash: HashAlgorithm,
}

impl CandidateKeyMaterial {
    pub fn new(
        passphrase: &PassphraseCandidate,
        salt: &[u8],
        iterations: u32,
        hash: HashAlgorithm,
    ) -> Self {
        live::track(1);
        Self {
            passphrase: SecretString::from(passphrase.expose().to_owned()),
            salt: Zeroizing::new(salt.to_vec()),
            iterations,
            hash,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn derive(&self) -> anyhow::Result<DerivedKey> {
        derive_key(&self.passphrase, &self.salt, self.iterations, self.hash)
    }
}

impl Drop for CandidateKeyMaterial {
    fn drop(&mut self) {
        live::track(-1);
    }
}

impl std::fmt::Debug for CandidateKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateKeyMaterial")
            .field("passphrase", &"[REDACTED]")
            .field("salt", &"[REDACTED]")
            .field("iterations", &self.iterations)
            .field("hash", &self.hash)
            .finish()
    }
}


#[cfg(not(test))]
mod live {
    #[inline(always)]
    pub fn track(_delta: i64) {}
}
