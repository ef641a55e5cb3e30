use std::fmt::{Debug, Formatter};

use sha2::{Digest, Sha256};

/// Shared bearer secret configured for the gateway.
///
/// Comparison goes through SHA-256 digests so the check does not short-circuit
/// on the first differing byte of the secret itself.
#[derive(Clone)]
pub struct ApiCredential {
    digest: [u8; 32],
}

impl ApiCredential {
    /// Creates a credential from the configured secret.
    ///
    /// Returns `None` for an empty or whitespace-only secret, which disables
    /// credential matching entirely.
    #[must_use]
    pub fn new(secret: &str) -> Option<Self> {
        if secret.trim().is_empty() {
            return None;
        }

        Some(Self {
            digest: digest(secret),
        })
    }

    /// Returns whether the presented token equals the configured secret.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        let presented = digest(presented);
        self.digest
            .iter()
            .zip(presented.iter())
            .fold(0_u8, |acc, (left, right)| acc | (left ^ right))
            == 0
    }

    /// Returns whether an `Authorization` header value carries this credential.
    #[must_use]
    pub fn matches_bearer(&self, authorization: Option<&str>) -> bool {
        authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| self.matches(token))
    }
}

impl Debug for ApiCredential {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("ApiCredential(<redacted>)")
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut output = [0_u8; 32];
    output.copy_from_slice(&Sha256::digest(value.as_bytes()));
    output
}

#[cfg(test)]
mod tests {
    use super::ApiCredential;

    #[test]
    fn empty_secret_disables_credential() {
        assert!(ApiCredential::new("").is_none());
        assert!(ApiCredential::new("   ").is_none());
    }

    #[test]
    fn bearer_header_must_match_exactly() {
        let credential = ApiCredential::new("secret");
        assert!(credential.is_some());
        let credential = credential.unwrap_or_else(|| unreachable!());

        assert!(credential.matches_bearer(Some("Bearer secret")));
        assert!(!credential.matches_bearer(Some("Bearer wrong")));
        assert!(!credential.matches_bearer(Some("secret")));
        assert!(!credential.matches_bearer(Some("bearer secret")));
        assert!(!credential.matches_bearer(None));
    }

    #[test]
    fn debug_output_is_redacted() {
        let credential = ApiCredential::new("top-secret");
        assert_eq!(
            format!("{credential:?}"),
            "Some(ApiCredential(<redacted>))"
        );
    }
}
