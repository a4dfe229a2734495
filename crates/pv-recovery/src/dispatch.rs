//! Legacy-format dispatch
//!
//! Stored ciphertext comes in two shapes:
//! ```text
//! Delimited: <salt_token>:<cipher_token>   salted PBKDF2 writers
//! Legacy:    <cipher_blob>                 constant-key / raw-passphrase writers
//! ```
//! Classification never fails. Anything that is not clearly `Delimited` is
//! `Legacy` and is left to fail decryption; the oracle decides what worked.

use pv_crypto::passphrase::ENVELOPE_B64_PREFIX;
use serde::Serialize;

/// Separator between salt token and cipher token
pub const SEPARATOR: char = ':';

/// Longest salt token a writer ever produced; longer first segments are
/// treated as cipher output.
pub const MAX_SALT_TOKEN_LEN: usize = 128;

/// On-disk ciphertext shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum Format {
    Delimited {
        salt_token: String,
        cipher_token: String,
    },
    Legacy {
        blob: String,
    },
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Delimited { .. } => "delimited",
            Format::Legacy { .. } => "legacy",
        }
    }

    /// The per-record salt token, if the format carries one.
    pub fn salt_token(&self) -> Option<&str> {
        match self {
            Format::Delimited { salt_token, .. } => Some(salt_token),
            Format::Legacy { .. } => None,
        }
    }

    /// The part handed to the cipher.
    pub fn cipher_text(&self) -> &str {
        match self {
            Format::Delimited { cipher_token, .. } => cipher_token,
            Format::Legacy { blob } => blob,
        }
    }
}

/// Decide which format a stored ciphertext string uses.
pub fn classify(ciphertext: &str) -> Format {
    let trimmed = ciphertext.trim();
    let legacy = || Format::Legacy {
        blob: trimmed.to_string(),
    };

    if trimmed.matches(SEPARATOR).count() != 1 {
        return legacy();
    }
    let Some((salt, cipher)) = trimmed.split_once(SEPARATOR) else {
        return legacy();
    };

    if salt.is_empty() || cipher.is_empty() || !plausible_salt_token(salt, cipher) {
        return legacy();
    }

    Format::Delimited {
        salt_token: salt.to_string(),
        cipher_token: cipher.to_string(),
    }
}

/// A salt token is a short opaque token, not cipher output.
fn plausible_salt_token(salt: &str, cipher: &str) -> bool {
    salt.len() <= MAX_SALT_TOKEN_LEN
        && salt.len() < cipher.len()
        && !salt.starts_with(ENVELOPE_B64_PREFIX)
        && !salt.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENVELOPE: &str = "U2FsdGVkX18BAgMEBQYHCAri6D9bmrXIPwJDbi73CtkCAEP8DGwvNPEG4VY0SnteWpaBjVYhAlD0E69LXhoDZe+lbFayH2Y0C+Ts8RcvjHpXo0gWE3RM45QtuYUfVEEhhJdoFFEV8svyvd/zLwSzxA==";

    #[test]
    fn test_no_delimiter_is_legacy() {
        assert_eq!(
            classify(ENVELOPE),
            Format::Legacy {
                blob: ENVELOPE.to_string()
            }
        );
    }

    #[test]
    fn test_single_delimiter_with_salt_is_delimited() {
        let stored = format!("9f86d081884c7d65:{ENVELOPE}");
        let format = classify(&stored);

        assert_eq!(format.name(), "delimited");
        assert_eq!(format.salt_token(), Some("9f86d081884c7d65"));
        assert_eq!(format.cipher_text(), ENVELOPE);
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let stored = format!("  abc123:{ENVELOPE}\n");
        assert_eq!(classify(&stored).salt_token(), Some("abc123"));
    }

    #[test]
    fn test_empty_is_legacy() {
        assert_eq!(classify(""), Format::Legacy { blob: String::new() });
        assert_eq!(classify("   ").name(), "legacy");
    }

    #[test]
    fn test_empty_parts_are_legacy() {
        assert_eq!(classify(&format!(":{ENVELOPE}")).name(), "legacy");
        assert_eq!(classify("abc123:").name(), "legacy");
    }

    #[test]
    fn test_multiple_delimiters_are_legacy() {
        let stored = format!("a:b:{ENVELOPE}");
        assert_eq!(
            classify(&stored),
            Format::Legacy { blob: stored.clone() }
        );
    }

    #[test]
    fn test_cipher_looking_first_segment_is_legacy() {
        let stored = format!("{ENVELOPE}:{ENVELOPE}x");
        assert_eq!(classify(&stored).name(), "legacy");
    }

    #[test]
    fn test_overlong_first_segment_is_legacy() {
        let salt = "a".repeat(MAX_SALT_TOKEN_LEN + 1);
        let cipher = "b".repeat(400);
        assert_eq!(classify(&format!("{salt}:{cipher}")).name(), "legacy");
    }

    #[test]
    fn test_first_segment_longer_than_cipher_is_legacy() {
        assert_eq!(classify("abcdefgh:xyz").name(), "legacy");
    }
}
