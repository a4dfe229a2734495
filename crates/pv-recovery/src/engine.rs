//! Recovery engine: escrow fast path, search, backfill.
//!
//! ```text
//! load record ─ none ─────────────────────────────► NotFound
//!      │
//!      ├─ escrow copy opens ──────────────────────► Success(EscrowCopy)
//!      │
//!      └─ search ─┬─ Success ─► backfill escrow ──► Success
//!                 ├─ quick mode ran dry ──────────► RequiresSecretHint
//!                 └─ budget / cancel / full dry ──► Exhausted
//! ```
//! Record I/O happens before and after the timed search, never inside it.

use pv_core::config::SearchConfig;
use pv_core::{VaultError, VaultResult};
use pv_crypto::EscrowKey;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn};

use crate::budget::{BudgetClock, SearchBudget};
use crate::escrow::{open_escrow_copy, EscrowWriter};
use crate::gate::{AccessGate, Caller};
use crate::record::{EncryptedRecord, RecoveryInput, RecoveryRequest};
use crate::result::{MethodTag, RecoveryResult};
use crate::search::{search, SearchPlan};
use crate::store::RecordStore;

pub struct RecoveryEngine<S: RecordStore> {
    store: S,
    escrow_key: EscrowKey,
    config: SearchConfig,
}

impl<S: RecordStore> RecoveryEngine<S> {
    pub fn new(store: S, escrow_key: EscrowKey, config: SearchConfig) -> Self {
        Self {
            store,
            escrow_key,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Recover a record for a caller the transport has already authorized.
    pub fn recover(&self, request: RecoveryRequest) -> VaultResult<RecoveryResult> {
        self.recover_with_cancel(request, &CancellationToken::new())
    }

    /// Like [`recover`](Self::recover); cancelling `cancel` stops the search
    /// before its next attempt and yields `Exhausted`.
    pub fn recover_with_cancel(
        &self,
        request: RecoveryRequest,
        cancel: &CancellationToken,
    ) -> VaultResult<RecoveryResult> {
        match self.store.load_record(&request.record_id)? {
            Some(record) => self.recover_record(request, record, cancel),
            None => {
                info!(record_id = %request.record_id, outcome = "not_found", "recovery finished");
                Ok(RecoveryResult::NotFound)
            }
        }
    }

    /// Authorize `caller` against the record owner, then recover.
    pub fn recover_as(
        &self,
        gate: &dyn AccessGate,
        caller: &Caller,
        request: RecoveryRequest,
        cancel: &CancellationToken,
    ) -> VaultResult<RecoveryResult> {
        let Some(record) = self.store.load_record(&request.record_id)? else {
            info!(record_id = %request.record_id, outcome = "not_found", "recovery finished");
            return Ok(RecoveryResult::NotFound);
        };

        if !gate.is_authorized(caller, &record.owner) {
            warn!(record_id = %request.record_id, caller = %caller.id, "recovery refused");
            return Err(VaultError::AuthorizationDenied(format!(
                "{} may not recover record {}",
                caller.id, request.record_id
            )));
        }

        self.recover_record(request, record, cancel)
    }

    fn recover_record(
        &self,
        request: RecoveryRequest,
        record: EncryptedRecord,
        cancel: &CancellationToken,
    ) -> VaultResult<RecoveryResult> {
        let span = info_span!(
            "recover",
            record_id = %request.record_id,
            format = record.format.name(),
            mode = tracing::field::Empty,
        );
        let _guard = span.enter();

        if let Some(sealed) = &record.escrow_ciphertext {
            if let Some(plaintext) = open_escrow_copy(&self.escrow_key, &request.record_id, sealed)
            {
                info!(
                    attempts = 0u64,
                    outcome = "success",
                    method = "escrow_copy",
                    "recovery finished"
                );
                return Ok(RecoveryResult::Success {
                    plaintext,
                    method: MethodTag::EscrowCopy,
                });
            }
        }

        let record_id = request.record_id;
        let input = RecoveryInput {
            record,
            identity_hint: request.identity_hint,
            secret_hint: request.secret_hint,
        };
        let plan = SearchPlan::for_request(&self.config, input.has_secret());
        span.record("mode", plan.mode.name());

        let clock = BudgetClock::start(SearchBudget::from(&self.config), cancel.clone());
        let result = search(&input, &plan, &clock);
        drop(input);

        info!(
            attempts = clock.attempts(),
            elapsed_ms = clock.elapsed().as_millis() as u64,
            outcome = result.outcome(),
            method = result.method().map(MethodTag::name),
            "recovery finished"
        );

        if let RecoveryResult::Success { plaintext, .. } = &result {
            let writer = EscrowWriter::new(&self.escrow_key, &self.store);
            if let Err(e) = writer.backfill(&record_id, plaintext) {
                warn!(error = %e, "escrow backfill failed, result unaffected");
            }
        }

        Ok(result)
    }
}
