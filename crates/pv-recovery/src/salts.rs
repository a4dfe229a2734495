//! Salt composer
//!
//! Salted writers hashed some permutation of (identity, record salt token,
//! era label) with SHA-256 and used the lowercase hex digest as the PBKDF2
//! salt. Enumeration order is part of the contract: orderings outer, labels
//! inner, both in table order. Quick mode keeps a prefix of that order.
//!
//! A digest already produced is skipped, so the list is shorter than 36
//! when parts coincide (a salt token equal to the identity yields 18). The
//! surviving entries keep their relative order.

use sha2::{Digest, Sha256};

use crate::eras::salt_labels;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Identity,
    Salt,
    Label,
}

const ORDERINGS: [[Part; 3]; 6] = [
    [Part::Identity, Part::Salt, Part::Label],
    [Part::Identity, Part::Label, Part::Salt],
    [Part::Salt, Part::Identity, Part::Label],
    [Part::Salt, Part::Label, Part::Identity],
    [Part::Label, Part::Identity, Part::Salt],
    [Part::Label, Part::Salt, Part::Identity],
];

/// Compose combined-salt candidates (hex digests) in enumeration order.
///
/// `limit` truncates the list (quick mode).
pub fn compose_salts(salt_token: &str, identity: &str, limit: Option<usize>) -> Vec<String> {
    let mut salts: Vec<String> = Vec::with_capacity(ORDERINGS.len() * 6);

    for ordering in ORDERINGS {
        for label in salt_labels() {
            let mut hasher = Sha256::new();
            for part in ordering {
                hasher.update(match part {
                    Part::Identity => identity.as_bytes(),
                    Part::Salt => salt_token.as_bytes(),
                    Part::Label => label.label.as_bytes(),
                });
            }
            let digest = hex::encode(hasher.finalize());
            if !salts.contains(&digest) {
                salts.push(digest);
            }
        }
    }

    if let Some(limit) = limit {
        salts.truncate(limit);
    }
    salts
}
