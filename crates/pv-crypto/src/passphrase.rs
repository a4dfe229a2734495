//! Passphrase-mode AES-256-CBC (OpenSSL `enc` compatible)
//!
//! Envelope format (base64 of):
//! ```text
//! ["Salted__"][8 bytes: random salt][N*16 bytes: AES-256-CBC ciphertext, PKCS#7]
//! key || iv = EVP_BytesToKey(MD5, passphrase, salt, 1 round)  (32 + 16 bytes)
//! ```
//!
//! There is no authentication tag. A wrong passphrase usually fails the
//! padding check, but roughly 1 in 256 attempts yields well-padded garbage,
//! so callers must validate the plaintext themselves.

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::{BLOCK_SIZE, ENVELOPE_SALT_SIZE, KEY_SIZE};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// OpenSSL salted-envelope magic
pub const ENVELOPE_MAGIC: &[u8; 8] = b"Salted__";

/// Base64 prefix every envelope starts with (`"Salted__"` encoded)
pub const ENVELOPE_B64_PREFIX: &str = "U2FsdGVkX1";

const HEADER_SIZE: usize = ENVELOPE_MAGIC.len() + ENVELOPE_SALT_SIZE;

/// Encrypt `plaintext` under `passphrase` with a fresh random envelope salt.
///
/// Returns the base64 envelope.
pub fn encrypt_with_passphrase(passphrase: &[u8], plaintext: &[u8]) -> anyhow::Result<String> {
    let mut salt = [0u8; ENVELOPE_SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);

    let (key, iv) = bytes_to_key(passphrase, &salt);
    let ciphertext = Aes256CbcEnc::new_from_slices(&key[..], &iv[..])
        .map_err(|e| anyhow::anyhow!("AES-256-CBC init: {e}"))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut envelope = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
    envelope.extend_from_slice(ENVELOPE_MAGIC);
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&ciphertext);
    Ok(B64.encode(envelope))
}

/// Decrypt a base64 envelope produced by [`encrypt_with_passphrase`] (or
/// `openssl enc -aes-256-cbc -md md5`).
///
/// An `Ok` result only means the padding was well formed, not that the
/// passphrase was right.
pub fn decrypt_with_passphrase(
    passphrase: &[u8],
    envelope: &str,
) -> anyhow::Result<Zeroizing<Vec<u8>>> {
    let raw = B64
        .decode(envelope.trim())
        .map_err(|e| anyhow::anyhow!("envelope is not base64: {e}"))?;

    if raw.len() < HEADER_SIZE + BLOCK_SIZE {
        anyhow::bail!(
            "envelope too short: {} bytes (minimum {})",
            raw.len(),
            HEADER_SIZE + BLOCK_SIZE
        );
    }
    if !raw.starts_with(ENVELOPE_MAGIC) {
        anyhow::bail!("envelope is missing the Salted__ header");
    }
    if (raw.len() - HEADER_SIZE) % BLOCK_SIZE != 0 {
        anyhow::bail!(
            "ciphertext length {} is not a multiple of the block size",
            raw.len() - HEADER_SIZE
        );
    }

    let (salt, ciphertext) = raw[ENVELOPE_MAGIC.len()..].split_at(ENVELOPE_SALT_SIZE);
    let (key, iv) = bytes_to_key(passphrase, salt);

    let plaintext = Aes256CbcDec::new_from_slices(&key[..], &iv[..])
        .map_err(|e| anyhow::anyhow!("AES-256-CBC init: {e}"))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| anyhow::anyhow!("bad padding: wrong passphrase or corrupted data"))?;

    Ok(Zeroizing::new(plaintext))
}

/// OpenSSL EVP_BytesToKey with MD5 and a single round.
///
/// `D_i = MD5(D_{i-1} || passphrase || salt)`, concatenated until 48 bytes.
fn bytes_to_key(passphrase: &[u8], salt: &[u8]) -> (Zeroizing<[u8; KEY_SIZE]>, [u8; BLOCK_SIZE]) {
    let mut material = Zeroizing::new([0u8; KEY_SIZE + BLOCK_SIZE]);
    let mut previous: Vec<u8> = Vec::new();
    let mut filled = 0;

    while filled < material.len() {
        let mut hasher = Md5::new();
        hasher.update(&previous);
        hasher.update(passphrase);
        hasher.update(salt);
        previous.zeroize();
        previous = hasher.finalize().to_vec();

        let take = previous.len().min(material.len() - filled);
        material[filled..filled + take].copy_from_slice(&previous[..take]);
        filled += take;
    }
    previous.zeroize();

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    key.copy_from_slice(&material[..KEY_SIZE]);
    let mut iv = [0u8; BLOCK_SIZE];
    iv.copy_from_slice(&material[KEY_SIZE..]);
    (key, iv)
}
