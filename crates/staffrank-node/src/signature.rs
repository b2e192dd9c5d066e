//! Ed25519 verification of inbound interaction requests.
//!
//! The platform signs `timestamp || body` with the application key and sends
//! the signature and timestamp as headers. Requests that fail verification
//! must be rejected before the body is looked at.

use crate::error::{Error, Result};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Header carrying the hex signature.
pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";

/// Header carrying the signed timestamp.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Verifies interaction signatures against the application public key.
#[derive(Debug, Clone)]
pub struct InteractionVerifier {
    key: VerifyingKey,
}

impl InteractionVerifier {
    /// Parse a hex-encoded 32-byte public key.
    pub fn from_hex(public_key: &str) -> Result<Self> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| Error::Config(format!("public key is not hex: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::Config("public key must be 32 bytes".to_string()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| Error::Config(format!("invalid public key: {e}")))?;
        Ok(Self { key })
    }

    /// Wrap an already-parsed key.
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Check `signature_hex` over `timestamp || body`.
    pub fn verify(&self, signature_hex: &str, timestamp: &str, body: &[u8]) -> Result<()> {
        let sig_bytes = hex::decode(signature_hex)
            .map_err(|e| Error::Signature(format!("signature is not hex: {e}")))?;
        let sig_bytes: [u8; 64] = sig_bytes
            .try_into()
            .map_err(|_| Error::Signature("signature must be 64 bytes".to_string()))?;
        let signature = Signature::from_bytes(&sig_bytes);

        let mut msg = Vec::with_capacity(timestamp.len() + body.len());
        msg.extend_from_slice(timestamp.as_bytes());
        msg.extend_from_slice(body);

        self.key
            .verify(&msg, &signature)
            .map_err(|_| Error::Signature("signature mismatch".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    fn sign(key: &SigningKey, timestamp: &str, body: &[u8]) -> String {
        let mut msg = timestamp.as_bytes().to_vec();
        msg.extend_from_slice(body);
        hex::encode(key.sign(&msg).to_bytes())
    }

    #[test]
    fn accepts_valid_signature() {
        let key = signing_key();
        let verifier = InteractionVerifier::from_hex(&hex::encode(key.verifying_key().to_bytes())).unwrap();

        let sig = sign(&key, "1700000000", br#"{"type":1}"#);
        assert!(verifier.verify(&sig, "1700000000", br#"{"type":1}"#).is_ok());
    }

    #[test]
    fn rejects_tampered_body_or_timestamp() {
        let key = signing_key();
        let verifier = InteractionVerifier::new(key.verifying_key());
        let sig = sign(&key, "1700000000", br#"{"type":1}"#);

        assert!(verifier.verify(&sig, "1700000000", br#"{"type":2}"#).is_err());
        assert!(verifier.verify(&sig, "1700000001", br#"{"type":1}"#).is_err());
    }

    #[test]
    fn rejects_malformed_signature() {
        let verifier = InteractionVerifier::new(signing_key().verifying_key());
        assert!(matches!(verifier.verify("zz", "1", b"{}"), Err(Error::Signature(_))));
        assert!(matches!(verifier.verify("abcd", "1", b"{}"), Err(Error::Signature(_))));
    }

    #[test]
    fn rejects_malformed_public_key() {
        assert!(InteractionVerifier::from_hex("not-hex").is_err());
        assert!(InteractionVerifier::from_hex("abcd").is_err());
    }
}
