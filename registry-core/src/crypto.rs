//! Cryptographic primitives for the registry.

use crate::types::{Hash256, Identity, SignatureBytes};
use curve25519_dalek::edwards::CompressedEdwardsY;
pub use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of data.
pub fn sha256(data: &[u8]) -> Hash256 {
    let hash = Sha256::digest(data);
    hash.into()
}

/// Whether the 32 bytes decode to a point on the Ed25519 curve.
///
/// Derived addresses must be off-curve so no private key can sign for them.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

/// Verify an Ed25519 signature made by `identity` over `message`.
pub fn verify(identity: &Identity, message: &[u8], signature: &SignatureBytes) -> bool {
    use ed25519_dalek::Verifier;

    let Ok(key) = VerifyingKey::from_bytes(identity.as_bytes()) else {
        return false;
    };
    let signature = Signature::from_bytes(signature.as_ref());
    key.verify(message, &signature).is_ok()
}

/// A signer that can create Ed25519 signatures.
pub struct Signer {
    signing_key: SigningKey,
}

impl Signer {
    /// Create a new signer from a signing key.
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Generate a new random signing key.
    pub fn generate() -> Self {
        use rand::rngs::OsRng;
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        Self { signing_key }
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> SignatureBytes {
        use ed25519_dalek::Signer as _;
        SignatureBytes::from(self.signing_key.sign(message).to_bytes())
    }

    /// Get the verifying (public) key.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Identity this signer authenticates as.
    pub fn identity(&self) -> Identity {
        Identity::from(self.signing_key.verifying_key())
    }
}
