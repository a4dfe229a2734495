//! Recovery search
//!
//! Routes a record by format and drives the scheduler over the candidate
//! space:
//!
//! ```text
//! Delimited: passphrase × iterations × hash × salt  (PBKDF2, then cipher)
//!            then, in full mode only, each passphrase used directly as
//!            the cipher passphrase
//! Legacy:    each constant key in era order
//!            then each passphrase used directly as the cipher passphrase
//! ```
//!
//! Every stage shares one budget clock. A candidate that fails to derive or
//! decrypt is a non-match; only the oracle says what worked.

use pv_core::config::SearchConfig;
use pv_core::HashAlgorithm;
use pv_crypto::decrypt_with_passphrase;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::budget::BudgetClock;
use crate::candidate::CandidateKeyMaterial;
use crate::dispatch::Format;
use crate::eras::{legacy_keys, LegacyKey};
use crate::oracle::validate_phrase;
use crate::passphrases::{compose_passphrases, PassphraseCandidate};
use crate::record::RecoveryInput;
use crate::result::{MethodTag, RecoveryResult};
use crate::salts::compose_salts;
use crate::scheduler::{first_match, ProductSpace, SearchOutcome};

/// Whether the caller supplied a password hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Full,
    Quick,
}

impl SearchMode {
    pub fn name(&self) -> &'static str {
        match self {
            SearchMode::Full => "full",
            SearchMode::Quick => "quick",
        }
    }
}

/// Candidate lists for one request.
#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub mode: SearchMode,
    pub iterations: Vec<u32>,
    pub hashes: Vec<HashAlgorithm>,
    /// Prefix of the combined-salt list to keep, `None` for all
    pub salt_limit: Option<usize>,
    pub parallel: bool,
}

impl SearchPlan {
    pub fn for_request(config: &SearchConfig, has_secret: bool) -> Self {
        if has_secret {
            Self {
                mode: SearchMode::Full,
                iterations: config.full_iterations.clone(),
                hashes: config.full_hashes.clone(),
                salt_limit: None,
                parallel: config.parallel,
            }
        } else {
            Self {
                mode: SearchMode::Quick,
                iterations: config.quick_iterations.clone(),
                hashes: config.quick_hashes.clone(),
                salt_limit: Some(config.quick_salt_limit),
                parallel: config.parallel,
            }
        }
    }
}

type Hit = (String, MethodTag);

/// Search the record's parameter space; first match in enumeration order wins.
pub fn search(input: &RecoveryInput, plan: &SearchPlan, clock: &BudgetClock) -> RecoveryResult {
    let outcome = match &input.record.format {
        Format::Delimited {
            salt_token,
            cipher_token,
        } => search_delimited(input, salt_token, cipher_token, plan, clock),
        Format::Legacy { blob } => search_legacy(input, blob, plan, clock),
    };

    match outcome {
        SearchOutcome::Found((plaintext, method)) => RecoveryResult::Success { plaintext, method },
        SearchOutcome::Stopped(reason) => {
            debug!(?reason, attempts = clock.attempts(), "search stopped early");
            RecoveryResult::Exhausted
        }
        SearchOutcome::SpaceExhausted => match plan.mode {
            SearchMode::Quick => RecoveryResult::RequiresSecretHint,
            SearchMode::Full => RecoveryResult::Exhausted,
        },
    }
}

fn search_delimited(
    input: &RecoveryInput,
    salt_token: &str,
    cipher_token: &str,
    plan: &SearchPlan,
    clock: &BudgetClock,
) -> SearchOutcome<Hit> {
    let passphrases = compose_passphrases(
        &input.identity_hint,
        input.secret_hint.as_ref(),
        Some(salt_token),
    );
    let salts = compose_salts(salt_token, &input.identity_hint, plan.salt_limit);
    let space = ProductSpace::new(
        passphrases.len(),
        plan.iterations.len(),
        plan.hashes.len(),
        salts.len(),
    );
    debug!(
        passphrases = passphrases.len(),
        salts = salts.len(),
        candidates = space.len(),
        "searching derived keys"
    );

    let derived = first_match(space.len(), clock, plan.parallel, |index| {
        let leaf = space.leaf(index);
        let passphrase = &passphrases[leaf.passphrase];
        let material = CandidateKeyMaterial::new(
            passphrase,
            salts[leaf.salt].as_bytes(),
            plan.iterations[leaf.iterations],
            plan.hashes[leaf.hash],
        );
        let plaintext = attempt_derived(&material, cipher_token)?;
        Some((
            plaintext,
            MethodTag::Derived {
                passphrase: passphrase.kind,
                passphrase_index: leaf.passphrase,
                iterations: material.iterations(),
                hash: material.hash(),
                salt_index: leaf.salt,
            },
        ))
    });
    if plan.mode == SearchMode::Quick || !matches!(derived, SearchOutcome::SpaceExhausted) {
        return derived;
    }

    search_raw(&passphrases, cipher_token, plan, clock)
}

fn search_legacy(
    input: &RecoveryInput,
    blob: &str,
    plan: &SearchPlan,
    clock: &BudgetClock,
) -> SearchOutcome<Hit> {
    let keys: Vec<&LegacyKey> = legacy_keys().collect();
    debug!(keys = keys.len(), "searching constant keys");

    let constant = first_match(keys.len(), clock, plan.parallel, |index| {
        let key = keys[index];
        let plaintext = accept(decrypt_with_passphrase(key.key.as_bytes(), blob))?;
        Some((plaintext, MethodTag::LegacyConstant { era: key.era }))
    });
    if !matches!(constant, SearchOutcome::SpaceExhausted) {
        return constant;
    }

    let passphrases =
        compose_passphrases(&input.identity_hint, input.secret_hint.as_ref(), None);
    search_raw(&passphrases, blob, plan, clock)
}

/// Passphrase candidates used directly as the cipher passphrase, no KDF.
fn search_raw(
    passphrases: &[PassphraseCandidate],
    cipher: &str,
    plan: &SearchPlan,
    clock: &BudgetClock,
) -> SearchOutcome<Hit> {
    debug!(passphrases = passphrases.len(), "searching raw passphrases");

    first_match(passphrases.len(), clock, plan.parallel, |index| {
        let passphrase = &passphrases[index];
        let plaintext = accept(decrypt_with_passphrase(passphrase.expose().as_bytes(), cipher))?;
        Some((
            plaintext,
            MethodTag::RawPassphrase {
                passphrase: passphrase.kind,
                passphrase_index: index,
            },
        ))
    })
}

fn attempt_derived(material: &CandidateKeyMaterial, cipher: &str) -> Option<String> {
    let key = match material.derive() {
        Ok(key) => key,
        Err(err) => {
            trace!(error = %err, "derivation failed");
            return None;
        }
    };
    accept(decrypt_with_passphrase(key.to_hex().as_bytes(), cipher))
}

fn accept(decrypted: anyhow::Result<Zeroizing<Vec<u8>>>) -> Option<String> {
    match decrypted {
        Ok(bytes) => validate_phrase(&bytes),
        Err(err) => {
            trace!(error = %err, "candidate rejected");
            None
        }
    }
}
