//! Records as the engine sees them.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::dispatch::{classify, Format};

/// An encrypted recovery phrase as stored by the persistence layer.
///
/// The engine only reads records; the escrow copy is written through
/// [`crate::store::RecordStore::store_escrow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredFields")]
pub struct EncryptedRecord {
    /// Account that owns the phrase (checked by the access gate)
    pub owner: String,
    /// Ciphertext exactly as stored
    pub ciphertext: String,
    /// Shape of `ciphertext`, derived on construction
    #[serde(skip_serializing)]
    pub format: Format,
    /// Canonical escrow copy, present once a recovery has succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escrow_ciphertext: Option<String>,
}

impl EncryptedRecord {
    pub fn new(
        owner: impl Into<String>,
        ciphertext: impl Into<String>,
        escrow_ciphertext: Option<String>,
    ) -> Self {
        let ciphertext = ciphertext.into();
        Self {
            owner: owner.into(),
            format: classify(&ciphertext),
            ciphertext,
            escrow_ciphertext,
        }
    }
}

#[derive(Deserialize)]
struct StoredFields {
    owner: String,
    ciphertext: String,
    #[serde(default)]
    escrow_ciphertext: Option<String>,
}

impl From<StoredFields> for EncryptedRecord {
    fn from(fields: StoredFields) -> Self {
        EncryptedRecord::new(fields.owner, fields.ciphertext, fields.escrow_ciphertext)
    }
}

/// Everything one search needs. Built per call, never persisted.
#[derive(Debug)]
pub struct RecoveryInput {
    pub record: EncryptedRecord,
    /// Account identity used at write time, e.g. the email address
    pub identity_hint: String,
    /// Account password, if the caller has it
    pub secret_hint: Option<SecretString>,
}

impl RecoveryInput {
    pub fn has_secret(&self) -> bool {
        self.secret_hint.is_some()
    }
}

/// A recovery call as received from the transport layer.
#[derive(Debug)]
pub struct RecoveryRequest {
    pub record_id: String,
    pub identity_hint: String,
    pub secret_hint: Option<SecretString>,
}
