//! # Registry Core
//!
//! Trust layer beneath an attestation service: parties register as
//! authorities and get verified by an admin, and deployers publish immutable
//! schemas that future attestations will reference.
//!
//! ## Key Features
//! - **Deterministic addressing**: every record lives at an address derived
//!   from a namespace and its identifying fields, so lookups never scan
//! - **Authority verification**: `Absent -> Unverified -> Verified`, admin-gated
//! - **One-shot schemas**: registered once per `(deployer, name)`, never updated
//! - **Canonical CBOR records**: discriminator-prefixed, exact round-trip

pub mod address;
pub mod authority;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod schema;
pub mod serialization;
pub mod transaction;
pub mod types;

pub use address::{AddressDerivator, DerivationError};
pub use authority::{AuthorityRecord, AuthorityStatus};
pub use config::RegistryConfig;
pub use crypto::Signer;
pub use error::{RegistryError, Result};
pub use ledger::{InMemoryLedger, Ledger, LedgerError};
pub use registry::{Registry, RegistryEvent, RegistryState};
pub use schema::{SchemaParams, SchemaRecord};
pub use transaction::{Instruction, Outcome, SignerSet, Transaction};
pub use types::*;

/// Re-export for convenience
pub use ed25519_dalek::{SigningKey, VerifyingKey};

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert_eq!(env!("CARGO_PKG_VERSION"), "0.1.0");
    }
}
