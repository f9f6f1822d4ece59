//! Request tokens for the manual conversion action.
//!
//! A token is the hex HMAC-SHA256 of an action string under a server secret.
//! The action string names the attachment, so a token issued for one
//! attachment never authorizes another.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use webpopt_image::AttachmentId;

use crate::{MediaError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Action string a convert token is bound to.
pub fn convert_action(id: AttachmentId) -> String {
    format!("convert-to-webp:{id}")
}

/// Checks request tokens.
pub trait NonceVerifier: Send + Sync {
    /// Whether `token` was issued for `action`.
    fn verify(&self, action: &str, token: &str) -> bool;
}

/// HMAC-SHA256 token issuer and verifier.
#[derive(Clone)]
pub struct HmacNonce {
    mac: HmacSha256,
}

impl HmacNonce {
    /// Create from a server secret.
    pub fn new(secret: &[u8]) -> Result<Self> {
        if secret.is_empty() {
            return Err(MediaError::InvalidSecret("empty secret".to_string()));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| MediaError::InvalidSecret(e.to_string()))?;
        Ok(Self { mac })
    }

    /// Issue a token for `action`.
    pub fn issue(&self, action: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(action.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl NonceVerifier for HmacNonce {
    fn verify(&self, action: &str, token: &str) -> bool {
        let expected = self.issue(action);
        if expected.len() != token.len() {
            return false;
        }
        expected.as_bytes().ct_eq(token.as_bytes()).into()
    }
}

impl std::fmt::Debug for HmacNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacNonce").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_is_hex_sha256() {
        let nonce = HmacNonce::new(b"secret").unwrap();
        let token = nonce.issue(&convert_action(AttachmentId(7)));

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_roundtrip() {
        let nonce = HmacNonce::new(b"secret").unwrap();
        let action = convert_action(AttachmentId(7));
        let token = nonce.issue(&action);

        assert!(nonce.verify(&action, &token));
    }

    #[test]
    fn test_token_bound_to_attachment() {
        let nonce = HmacNonce::new(b"secret").unwrap();
        let token = nonce.issue(&convert_action(AttachmentId(7)));

        assert!(!nonce.verify(&convert_action(AttachmentId(8)), &token));
    }

    #[test]
    fn test_token_bound_to_secret() {
        let a = HmacNonce::new(b"secret-a").unwrap();
        let b = HmacNonce::new(b"secret-b").unwrap();
        let action = convert_action(AttachmentId(1));

        assert!(!b.verify(&action, &a.issue(&action)));
    }

    #[test]
    fn test_rejects_garbage() {
        let nonce = HmacNonce::new(b"secret").unwrap();
        let action = convert_action(AttachmentId(1));

        assert!(!nonce.verify(&action, ""));
        assert!(!nonce.verify(&action, "deadbeef"));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(HmacNonce::new(b""), Err(MediaError::InvalidSecret(_))));
    }
}
