//! Escrow fast path and backfill

use pv_core::{VaultError, VaultResult};
use pv_crypto::{open_escrow, seal_escrow, EscrowKey};
use tracing::{info, warn};

use crate::oracle::validate_phrase_str;
use crate::store::RecordStore;

/// Open a record's escrow copy. `None` if it is unreadable or does not hold
/// a recovery phrase, in which case the caller falls back to the search.
pub fn open_escrow_copy(key: &EscrowKey, record_id: &str, sealed: &str) -> Option<String> {
    match open_escrow(key, sealed) {
        Ok(plaintext) => {
            let phrase = validate_phrase_str(&plaintext);
            if phrase.is_none() {
                warn!(record_id, "escrow copy does not hold a recovery phrase, searching instead");
            }
            phrase
        }
        Err(e) => {
            warn!(record_id, error = %e, "escrow copy unreadable, searching instead");
            None
        }
    }
}

/// Re-seals recovered phrases under the canonical escrow key.
pub struct EscrowWriter<'a, S: RecordStore + ?Sized> {
    key: &'a EscrowKey,
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> EscrowWriter<'a, S> {
    pub fn new(key: &'a EscrowKey, store: &'a S) -> Self {
        Self { key, store }
    }

    /// Seal `plaintext` and write it as the record's escrow copy.
    ///
    /// Unconditional: a second call overwrites the first with an equivalent
    /// envelope.
    pub fn backfill(&self, record_id: &str, plaintext: &str) -> VaultResult<()> {
        let sealed = seal_escrow(self.key, plaintext)
            .map_err(|e| VaultError::Escrow(format!("sealing escrow copy: {e:#}")))?;

        self.store
            .store_escrow(record_id, &sealed)
            .map_err(|e| VaultError::Escrow(format!("storing escrow copy: {e}")))?;

        info!(record_id, "escrow copy written");
        Ok(())
    }
}
