//! pv-crypto: primitives behind phrasevault's secret recovery
//!
//! Legacy records were written as:
//! ```text
//! combined_salt = hex(SHA-256(permutation of identity, record salt, era label)))
//! key           = hex(PBKDF2-HMAC-{SHA1,SHA256,SHA512}(passphrase, combined_salt, iterations, 32))
//! ciphertext    = base64("Salted__" || salt(8) || AES-256-CBC(EVP_BytesToKey-MD5(key, salt), phrase))
//! ```
//! with none of the parameters recorded. This crate provides the derivation and
//! the passphrase-mode cipher; the search over parameters lives in pv-recovery.
//!
//! Recovered phrases are re-sealed under the escrow envelope (`pv1$...`) so
//! later reads need a single derivation instead of a search.

pub mod escrow;
pub mod kdf;
pub mod passphrase;

pub use escrow::{open_escrow, seal_escrow, EscrowKey};
pub use kdf::{derive_key, DerivedKey};
pub use passphrase::{decrypt_with_passphrase, encrypt_with_passphrase};

/// Size of a derived key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// AES block size, also the CBC IV size
pub const BLOCK_SIZE: usize = 16;

/// Size of the salt embedded in an OpenSSL "Salted__" envelope
pub const ENVELOPE_SALT_SIZE: usize = 8;
