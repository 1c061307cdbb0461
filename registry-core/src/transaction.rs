//! Signed transactions and signer authentication.
//!
//! The registry never authenticates callers itself. It asks a [`SignerSet`]
//! whether a claimed identity signed the current request. A [`Transaction`]
//! is the usual implementation: an [`Instruction`] plus Ed25519 signatures over
//! the canonical CBOR encoding of `(program_id, instruction)`, so a signature
//! made for one deployment does not verify on another.

use crate::authority::AuthorityRecord;
use crate::crypto::{self, Signer};
use crate::schema::SchemaParams;
use crate::serialization::{from_canonical_cbor, to_canonical_cbor, SerializationError};
use crate::types::{Address, Identity, SchemaUid, SignatureBytes};
use serde::{Deserialize, Serialize};

/// Authenticates the signers of the request being processed.
pub trait SignerSet {
    /// Whether `claimed` signed the current request.
    fn verify_signer(&self, claimed: &Identity) -> bool;
}

/// Identities the host has already authenticated.
impl SignerSet for [Identity] {
    fn verify_signer(&self, claimed: &Identity) -> bool {
        self.contains(claimed)
    }
}

impl<const N: usize> SignerSet for [Identity; N] {
    fn verify_signer(&self, claimed: &Identity) -> bool {
        self.as_slice().verify_signer(claimed)
    }
}

impl SignerSet for Vec<Identity> {
    fn verify_signer(&self, claimed: &Identity) -> bool {
        self.as_slice().verify_signer(claimed)
    }
}

/// A state-mutating request against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    Initialize,
    FindOrSetAuthority {
        authority: Identity,
        signer: Identity,
    },
    UpdateAuthority {
        authority: Identity,
        verified: bool,
        admin: Identity,
    },
    Register {
        deployer: Identity,
        payer: Identity,
        schema: SchemaParams,
    },
}

/// Result of processing a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Initialized,
    Authority(AuthorityRecord),
    SchemaRegistered(SchemaUid),
}

/// What every signature covers.
#[derive(Serialize)]
struct SignedPayload<'a> {
    program_id: &'a Address,
    instruction: &'a Instruction,
}

/// An instruction together with the signatures authorizing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Deployment the instruction is addressed to.
    pub program_id: Address,
    pub instruction: Instruction,
    pub signatures: Vec<(Identity, SignatureBytes)>,
}

impl Transaction {
    /// Create an unsigned transaction for the registry at `program_id`.
    pub fn new(program_id: Address, instruction: Instruction) -> Self {
        Self {
            program_id,
            instruction,
            signatures: Vec::new(),
        }
    }

    /// Bytes every signature covers.
    pub fn message(&self) -> Result<Vec<u8>, SerializationError> {
        to_canonical_cbor(&SignedPayload {
            program_id: &self.program_id,
            instruction: &self.instruction,
        })
    }

    /// Add a signature from `signer`.
    pub fn sign(mut self, signer: &Signer) -> Result<Self, SerializationError> {
        let message = self.message()?;
        self.signatures.push((signer.identity(), signer.sign(&message)));
        Ok(self)
    }

    /// Serialize to canonical CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        to_canonical_cbor(self)
    }

    /// Deserialize from canonical CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerializationError> {
        from_canonical_cbor(bytes)
    }
}

impl SignerSet for Transaction {
    fn verify_signer(&self, claimed: &Identity) -> bool {
        let Ok(message) = self.message() else {
            return false;
        };
        self.signatures
            .iter()
            .filter(|(identity, _)| identity == claimed)
            .any(|(identity, signature)| crypto::verify(identity, &message, signature))
    }
}
