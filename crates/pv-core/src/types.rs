use serde::{Deserialize, Serialize};

/// Hash function underlying a PBKDF2-HMAC derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_algorithm_serde_names() {
        #[derive(Deserialize)]
        struct Wrap {
            hashes: Vec<HashAlgorithm>,
        }

        let parsed: Wrap = toml::from_str(r#"hashes = ["sha1", "sha256", "sha512"]"#).unwrap();
        assert_eq!(
            parsed.hashes,
            vec![
                HashAlgorithm::Sha1,
                HashAlgorithm::Sha256,
                HashAlgorithm::Sha512
            ]
        );
        assert_eq!(HashAlgorithm::Sha256.to_string(), "sha256");
    }
}
