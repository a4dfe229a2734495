//! Recovery outcomes

use pv_core::HashAlgorithm;
use serde::Serialize;

use crate::eras::Era;
use crate::passphrases::PassphraseKind;

/// Terminal result of a recovery call.
///
/// These are expected outcomes, not faults: system errors travel as
/// `VaultError` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecoveryResult {
    Success { plaintext: String, method: MethodTag },
    /// Passwordless search ran out; a password may unlock more candidates.
    RequiresSecretHint,
    NotFound,
    /// Budget spent, request cancelled, or full search found nothing.
    Exhausted,
}

impl RecoveryResult {
    /// Stable outcome name for logs and exit codes.
    pub fn outcome(&self) -> &'static str {
        match self {
            RecoveryResult::Success { .. } => "success",
            RecoveryResult::RequiresSecretHint => "requires_secret_hint",
            RecoveryResult::NotFound => "not_found",
            RecoveryResult::Exhausted => "exhausted",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RecoveryResult::Success { .. })
    }

    pub fn method(&self) -> Option<&MethodTag> {
        match self {
            RecoveryResult::Success { method, .. } => Some(method),
            _ => None,
        }
    }
}

/// Which path recovered the plaintext. Audit only; never drives behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum MethodTag {
    EscrowCopy,
    Derived {
        passphrase: PassphraseKind,
        passphrase_index: usize,
        iterations: u32,
        hash: HashAlgorithm,
        salt_index: usize,
    },
    RawPassphrase {
        passphrase: PassphraseKind,
        passphrase_index: usize,
    },
    LegacyConstant {
        era: Era,
    },
}

impl MethodTag {
    pub fn name(&self) -> &'static str {
        match self {
            MethodTag::EscrowCopy => "escrow_copy",
            MethodTag::Derived { .. } => "derived",
            MethodTag::RawPassphrase { .. } => "raw_passphrase",
            MethodTag::LegacyConstant { .. } => "legacy_constant",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_json_shape() {
        let result = RecoveryResult::Success {
            plaintext: "abandon ability".into(),
            method: MethodTag::Derived {
                passphrase: PassphraseKind::IdentitySecret,
                passphrase_index: 2,
                iterations: 10_000,
                hash: HashAlgorithm::Sha256,
                salt_index: 7,
            },
        };
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["method"]["path"], "derived");
        assert_eq!(json["method"]["passphrase"], "identity_secret");
        assert_eq!(json["method"]["hash"], "sha256");
        assert_eq!(json["method"]["salt_index"], 7);
    }

    #[test]
    fn test_unit_outcomes_json() {
        for (result, status) in [
            (RecoveryResult::RequiresSecretHint, "requires_secret_hint"),
            (RecoveryResult::NotFound, "not_found"),
            (RecoveryResult::Exhausted, "exhausted"),
        ] {
            let json = serde_json::to_value(&result).unwrap();
            assert_eq!(json["status"], status);
            assert_eq!(result.outcome(), status);
            assert!(result.method().is_none());
        }
    }

    #[test]
    fn test_legacy_constant_carries_era() {
        let json = serde_json::to_value(MethodTag::LegacyConstant { era: Era::Rotation }).unwrap();
        assert_eq!(json["path"], "legacy_constant");
        assert_eq!(json["era"], "rotation");
    }
}
