//! Plaintext oracle
//!
//! The legacy cipher carries no authentication tag, so a wrong key can still
//! produce well-padded bytes. The only evidence that a candidate was right is
//! that the output has the shape of a recovery phrase: 12, 15, 18, 21 or 24
//! words, each 2-15 lowercase ASCII letters. Do not loosen this.

/// Word counts of standard recovery phrases
pub const WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

pub const MIN_WORD_LEN: usize = 2;
pub const MAX_WORD_LEN: usize = 15;

/// Accept decrypted bytes as a recovery phrase.
///
/// Returns the phrase with whitespace normalised to single spaces.
pub fn validate_phrase(raw: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(raw).ok()?;
    validate_phrase_str(text)
}

pub fn validate_phrase_str(text: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();

    if !WORD_COUNTS.contains(&words.len()) {
        return None;
    }
    if !words.iter().all(|w| is_phrase_word(w)) {
        return None;
    }

    Some(words.join(" "))
}

fn is_phrase_word(word: &str) -> bool {
    (MIN_WORD_LEN..=MAX_WORD_LEN).contains(&word.len())
        && word.bytes().all(|b| b.is_ascii_lowercase())
}
