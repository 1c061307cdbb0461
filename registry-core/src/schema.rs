//! Schema records: one-shot registration and lookup by UID.

use crate::error::{RegistryError, Result};
use crate::ledger::{Ledger, LedgerError};
use crate::registry::{require_signer, Registry, RegistryEvent};
use crate::serialization::{encode_record, Record};
use crate::transaction::SignerSet;
use crate::types::{Identity, SchemaUid};
use serde::{Deserialize, Serialize};

/// Caller-supplied fields of a new schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaParams {
    /// Part of the UID derivation, so at most 32 bytes.
    pub name: String,
    /// Opaque schema definition, stored verbatim.
    pub content: String,
    pub resolver: Option<Identity>,
    pub revocable: bool,
}

impl SchemaParams {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            resolver: None,
            revocable: false,
        }
    }

    pub fn resolver(mut self, resolver: Identity) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn revocable(mut self, revocable: bool) -> Self {
        self.revocable = revocable;
        self
    }
}

/// An immutable registered schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRecord {
    /// Derived address of this record; the handle callers keep.
    pub uid: SchemaUid,
    pub deployer: Identity,
    pub name: String,
    pub content: String,
    /// Handler consulted at attestation time. `None` means no resolver.
    pub resolver: Option<Identity>,
    /// Whether attestations under this schema may later be revoked.
    pub revocable: bool,
}

impl Record for SchemaRecord {
    const TYPE_NAME: &'static str = "SchemaData";
}

impl<L: Ledger> Registry<L> {
    /// Register a schema under `(deployer, name)` and return its UID.
    ///
    /// `payer` funds the storage and must sign, but is not recorded.
    pub fn register<S: SignerSet + ?Sized>(
        &mut self,
        auth: &S,
        params: SchemaParams,
        deployer: &Identity,
        payer: &Identity,
    ) -> Result<SchemaUid> {
        self.ensure_initialized()?;
        require_signer(auth, deployer)?;
        require_signer(auth, payer)?;

        if params.name.is_empty() {
            return Err(RegistryError::InvalidSchemaName(
                "name must not be empty".to_string(),
            ));
        }
        if params.content.len() > self.config.max_schema_len {
            return Err(RegistryError::SchemaTooLarge {
                len: params.content.len(),
                max: self.config.max_schema_len,
            });
        }

        let uid = self.derivator.schema(deployer, &params.name)?;

        if self.config.require_verified_deployer {
            self.ensure_verified(deployer)?;
        }

        let record = SchemaRecord {
            uid,
            deployer: *deployer,
            name: params.name,
            content: params.content,
            resolver: params.resolver,
            revocable: params.revocable,
        };

        match self.ledger.create(uid, encode_record(&record)?) {
            Ok(()) => {
                tracing::info!(
                    "Registered schema {:?} for {} at {}",
                    record.name,
                    deployer,
                    uid
                );
                self.emit(RegistryEvent::SchemaRegistered {
                    uid,
                    deployer: *deployer,
                    name: record.name,
                });
                Ok(uid)
            }
            Err(LedgerError::Occupied(address)) => {
                tracing::warn!("Schema {:?} already registered by {}", record.name, deployer);
                Err(RegistryError::AlreadyExists(address))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read the schema stored at `uid`.
    pub fn fetch(&self, uid: &SchemaUid) -> Result<SchemaRecord> {
        self.load(uid)
    }

    fn ensure_verified(&self, deployer: &Identity) -> Result<()> {
        match self.fetch_authority(deployer) {
            Ok(record) if record.is_verified => Ok(()),
            Ok(_) | Err(RegistryError::NotFound(_)) => {
                Err(RegistryError::AuthorityNotVerified(*deployer))
            }
            Err(e) => Err(e),
        }
    }
}
