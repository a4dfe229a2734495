//! pv-recovery: recovers encrypted recovery phrases whose write-time
//! parameters were never recorded
//!
//! Request flow:
//!   1. load the record; absent ⇒ `NotFound`
//!   2. escrow copy present and valid ⇒ done, no search
//!   3. classify the ciphertext (delimited salt token vs legacy blob)
//!   4. search passphrase × iterations × hash × salt under a budget,
//!      first phrase-shaped plaintext wins
//!   5. on success, re-seal under the escrow key and store it

pub mod budget;
pub mod candidate;
pub mod dispatch;
pub mod engine;
pub mod eras;
pub mod escrow;
pub mod gate;
pub mod oracle;
pub mod passphrases;
pub mod record;
pub mod result;
pub mod salts;
pub mod scheduler;
pub mod search;
pub mod store;

pub use dispatch::{classify, Format};
pub use engine::RecoveryEngine;
pub use gate::{AccessGate, Caller, OwnerOrPrivileged, Role};
pub use oracle::validate_phrase;
pub use record::{EncryptedRecord, RecoveryInput, RecoveryRequest};
pub use result::{MethodTag, RecoveryResult};
pub use store::{JsonFileStore, MemoryStore, RecordStore};
