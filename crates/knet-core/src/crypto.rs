//! Cryptographic primitives for knet.
//!
//! Wraps Ed25519 signing with strong types. Keys and signatures travel as
//! standard padded base64 of their raw bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;

use crate::error::{CoreError, Result};

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encode as base64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse from base64.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = STANDARD.decode(s.trim())?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::InvalidPublicKey)?;
        Ok(Self(arr))
    }

    /// Short hex fingerprint for logs and display.
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0[..8])
    }

    /// Verify a base64 signature over a message.
    pub fn verify(&self, message: &[u8], signature_b64: &str) -> Result<()> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CoreError::InvalidPublicKey)?;

        let raw = STANDARD
            .decode(signature_b64.trim())
            .map_err(|_| CoreError::InvalidSignature)?;
        let bytes: [u8; 64] = raw
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::InvalidSignature)?;
        let sig = Signature::from_bytes(&bytes);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl From<[u8; 32]> for PublicKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// An Ed25519 keypair used to sign entities.
///
/// This wraps ed25519-dalek's SigningKey.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new keypair from the OS entropy source.
    pub fn generate() -> Result<Self> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| CoreError::Entropy(e.to_string()))?;
        Ok(Self::from_seed(&seed))
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Restore from a base64-encoded seed, as stored in configuration.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = STANDARD.decode(s.trim())?;
        let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CoreError::InvalidPrivateKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_seed(&seed))
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message, returning the base64 signature.
    pub fn sign(&self, message: &[u8]) -> String {
        let sig = self.signing_key.sign(message);
        STANDARD.encode(sig.to_bytes())
    }

    /// Get the raw seed bytes (secret key material).
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Encode the seed as base64 for storage.
    pub fn seed_base64(&self) -> String {
        STANDARD.encode(self.seed())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

/// Generate a fresh keypair.
pub fn generate_keypair() -> Result<Keypair> {
    Keypair::generate()
}

/// Sign a message (bytes or string) and return the base64 signature.
pub fn sign(message: impl AsRef<[u8]>, keypair: &Keypair) -> String {
    keypair.sign(message.as_ref())
}

/// Verify a base64 signature against a base64 public key.
///
/// Returns false on any decoding failure or mismatch; never errors.
pub fn verify(message: impl AsRef<[u8]>, signature_b64: &str, public_key_b64: &str) -> bool {
    match PublicKey::from_base64(public_key_b64) {
        Ok(pk) => pk.verify(message.as_ref(), signature_b64).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_sign_verify() {
        let keypair = Keypair::generate().unwrap();
        let message = b"hello world";
        let signature = keypair.sign(message);

        keypair
            .public_key()
            .verify(message, &signature)
            .expect("valid signature should verify");

        // Tampered message should fail
        assert!(keypair.public_key().verify(b"hello worlD", &signature).is_err());
    }

    #[test]
    fn test_keypair_deterministic_from_seed() {
        let seed = [0x42u8; 32];
        let kp1 = Keypair::from_seed(&seed);
        let kp2 = Keypair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());

        // RFC 8032 signatures are deterministic
        assert_eq!(kp1.sign(b"msg"), kp2.sign(b"msg"));
    }

    #[test]
    fn test_seed_base64_roundtrip() {
        let keypair = Keypair::generate().unwrap();
        let restored = Keypair::from_base64(&keypair.seed_base64()).unwrap();
        assert_eq!(keypair.public_key(), restored.public_key());
    }

    #[test]
    fn test_public_key_base64_roundtrip() {
        let pk = Keypair::from_seed(&[7; 32]).public_key();
        let recovered = PublicKey::from_base64(&pk.to_base64()).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn test_verify_never_errors_on_garbage() {
        let keypair = Keypair::from_seed(&[1; 32]);
        let pk = keypair.public_key().to_base64();
        let sig = sign("message", &keypair);

        assert!(verify("message", &sig, &pk));
        assert!(!verify("message", "not base64!!", &pk));
        assert!(!verify("message", &sig, "AAAA"));
        assert!(!verify("message", "", ""));
        // Valid base64, wrong length
        assert!(!verify("message", "AAAA", &pk));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signer = Keypair::from_seed(&[1; 32]);
        let other = Keypair::from_seed(&[2; 32]);
        let sig = sign(b"payload", &signer);
        assert!(!verify(b"payload", &sig, &other.public_key().to_base64()));
    }

    #[test]
    fn test_private_key_wrong_length() {
        let short = STANDARD.encode([0u8; 16]);
        assert!(matches!(
            Keypair::from_base64(&short),
            Err(CoreError::InvalidPrivateKey(_))
        ));
    }
}
