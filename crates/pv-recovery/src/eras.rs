//! Historical constants, one row per scheme era.
//!
//! Earlier writers embedded these inline. Composers read them only through
//! [`salt_labels`] and [`legacy_keys`]; supporting another era means adding
//! a row here, the search loop is untouched. Row order is enumeration order.

use serde::Serialize;

/// Scheme generations that wrote recovery phrases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    /// Constant-key blobs, no per-record salt
    Genesis,
    /// Constant-key blobs after the first key rotation
    Rotation,
    /// First salted PBKDF2 writer
    SaltedV1,
    /// Label renamed when the wallet module split out
    SaltedV2,
    /// Label renamed for the recovery-phrase feature
    SaltedV3,
    /// Last writer before escrow
    SaltedV4,
}

/// A label mixed into the combined salt by some writer generation.
#[derive(Debug, Clone, Copy)]
pub struct SaltLabel {
    pub label: &'static str,
    pub era: Era,
}

/// A fixed passphrase used by constant-key writers.
#[derive(Debug, Clone, Copy)]
pub struct LegacyKey {
    pub key: &'static str,
    pub era: Era,
}

const SALT_LABELS: [SaltLabel; 6] = [
    SaltLabel { label: "phrase-salt-v4", era: Era::SaltedV4 },
    SaltLabel { label: "recovery-phrase", era: Era::SaltedV3 },
    SaltLabel { label: "wallet-seed", era: Era::SaltedV2 },
    SaltLabel { label: "wallet-salt", era: Era::SaltedV2 },
    SaltLabel { label: "seed-phrase", era: Era::SaltedV1 },
    SaltLabel { label: "mnemonic", era: Era::SaltedV1 },
];

const LEGACY_KEYS: [LegacyKey; 2] = [
    LegacyKey { key: "wallet-dashboard-secret-key", era: Era::Rotation },
    LegacyKey { key: "default-encryption-key", era: Era::Genesis },
];

/// Salt labels in enumeration order.
pub fn salt_labels() -> impl Iterator<Item = &'static SaltLabel> {
    SALT_LABELS.iter()
}

/// Constant keys in enumeration order.
pub fn legacy_keys() -> impl Iterator<Item = &'static LegacyKey> {
    LEGACY_KEYS.iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_labels_are_distinct_and_non_empty() {
        let labels: HashSet<_> = salt_labels().map(|l| l.label).collect();
        assert_eq!(labels.len(), 6);
        assert!(labels.iter().all(|l| !l.is_empty()));
    }

    #[test]
    fn test_two_legacy_keys() {
        let keys: Vec<_> = legacy_keys().collect();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys[0].key, keys[1].key);
    }
}
