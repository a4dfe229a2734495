//! Passphrase composer
//!
//! Writers built the PBKDF2 passphrase from the account identity, the account
//! password and (in the earliest salted era) the record's salt token, in
//! several concatenations and with inconsistent normalisation. This module
//! enumerates those compositions in a fixed order.
//!
//! Full mode (password known), per identity variant `i`, per secret variant `s`:
//! ```text
//! i, s, i+s, s+i, i:s, s:i
//! ```
//! followed by `salt`, then `i+salt, salt+i` per identity variant.
//!
//! Quick mode (no password): `salt`, then `i+salt, salt+i` per identity
//! variant. Records without a salt token fall back to the bare identity
//! variants. Empty strings and repeats are dropped, first occurrence wins.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use zeroize::Zeroizing;

/// Which composition produced a passphrase candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassphraseKind {
    Identity,
    Secret,
    IdentitySecret,
    SecretIdentity,
    IdentityColonSecret,
    SecretColonIdentity,
    SaltToken,
    IdentitySalt,
    SaltIdentity,
}

impl PassphraseKind {
    /// Whether the composition includes the account password.
    pub fn uses_secret(&self) -> bool {
        matches!(
            self,
            PassphraseKind::Secret
                | PassphraseKind::IdentitySecret
                | PassphraseKind::SecretIdentity
                | PassphraseKind::IdentityColonSecret
                | PassphraseKind::SecretColonIdentity
        )
    }
}

/// One passphrase to try.
pub struct PassphraseCandidate {
    pub kind: PassphraseKind,
    text: SecretString,
}

impl PassphraseCandidate {
    pub fn expose(&self) -> &str {
        self.text.expose_secret()
    }
}

impl std::fmt::Debug for PassphraseCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassphraseCandidate")
            .field("kind", &self.kind)
            .field("text", &"[REDACTED]")
            .finish()
    }
}

/// Compose passphrase candidates in enumeration order.
///
/// `secret` selects full mode; `salt_token` is `None` for legacy records.
pub fn compose_passphrases(
    identity: &str,
    secret: Option<&SecretString>,
    salt_token: Option<&str>,
) -> Vec<PassphraseCandidate> {
    let identities = identity_variants(identity);
    let mut out = Candidates::default();

    if let Some(secret) = secret {
        let secrets = secret_variants(secret.expose_secret());
        for i in &identities {
            for s in secrets.iter() {
                let (i, s) = (i.as_str(), s.as_str());
                out.push(PassphraseKind::Identity, i.to_string());
                out.push(PassphraseKind::Secret, s.to_string());
                out.push(PassphraseKind::IdentitySecret, format!("{i}{s}"));
                out.push(PassphraseKind::SecretIdentity, format!("{s}{i}"));
                out.push(PassphraseKind::IdentityColonSecret, format!("{i}:{s}"));
                out.push(PassphraseKind::SecretColonIdentity, format!("{s}:{i}"));
            }
        }
    }

    match salt_token {
        Some(salt) => {
            out.push(PassphraseKind::SaltToken, salt.to_string());
            for i in &identities {
                out.push(PassphraseKind::IdentitySalt, format!("{i}{salt}"));
                out.push(PassphraseKind::SaltIdentity, format!("{salt}{i}"));
            }
        }
        None if secret.is_none() => {
            for i in &identities {
                out.push(PassphraseKind::Identity, i.to_string());
            }
        }
        None => {}
    }

    out.list
}

/// original, trimmed, lowercase, trimmed+lowercase; repeats removed
fn identity_variants(identity: &str) -> Vec<String> {
    let trimmed = identity.trim();
    dedup([
        identity.to_string(),
        trimmed.to_string(),
        identity.to_lowercase(),
        trimmed.to_lowercase(),
    ])
}

/// original, trimmed; repeats removed
fn secret_variants(secret: &str) -> Vec<Zeroizing<String>> {
    let mut variants = vec![Zeroizing::new(secret.to_string())];
    if secret.trim() != secret {
        variants.push(Zeroizing::new(secret.trim().to_string()));
    }
    variants
}

fn dedup<const N: usize>(items: [String; N]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(N);
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[derive(Default)]
struct Candidates {
    list: Vec<PassphraseCandidate>,
}

impl Candidates {
    fn push(&mut self, kind: PassphraseKind, text: String) {
        let mut text = Zeroizing::new(text);
        if text.is_empty() || self.list.iter().any(|c| c.expose() == text.as_str()) {
            return;
        }
        self.list.push(PassphraseCandidate {
            kind,
            text: SecretString::from(std::mem::take(&mut *text)),
        });
    }
}
