//! Error types for registry operations.

use crate::address::DerivationError;
use crate::ledger::LedgerError;
use crate::serialization::SerializationError;
use crate::types::{Address, Identity};
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Every failure leaves ledger state exactly as it was before the call.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry is not initialized")]
    NotInitialized,

    #[error("Registry is already initialized")]
    AlreadyInitialized,

    #[error("Record already exists at {0}")]
    AlreadyExists(Address),

    #[error("No record at {0}")]
    NotFound(Address),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Address derivation failed: {0}")]
    AddressDerivation(#[from] DerivationError),

    #[error("Authority {0} is not verified")]
    AuthorityNotVerified(Identity),

    #[error("Authority {0} is verified and cannot be demoted")]
    DemotionNotPermitted(Identity),

    #[error("Schema content is {len} bytes, maximum is {max}")]
    SchemaTooLarge { len: usize, max: usize },

    #[error("Invalid schema name: {0}")]
    InvalidSchemaName(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Configuration error: {0}")]
    Config(String),
}
