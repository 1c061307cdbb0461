//! Authority records and their verification state machine.
//!
//! ```text
//! Absent --find_or_set_authority--> Unverified --update_authority(true)--> Verified
//! ```
//!
//! `Verified` is terminal: an attempt to set `verified = false` on a verified
//! authority fails with [`RegistryError::DemotionNotPermitted`].

use crate::error::{RegistryError, Result};
use crate::ledger::{Ledger, LedgerError};
use crate::registry::{require_signer, Registry, RegistryEvent};
use crate::serialization::{encode_record, Record};
use crate::transaction::SignerSet;
use crate::types::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityRecord {
    /// The registered party. Never changes once written.
    pub authority: Identity,
    pub is_verified: bool,
}

impl Record for AuthorityRecord {
    const TYPE_NAME: &'static str = "AuthorityRecord";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityStatus {
    Unverified,
    Verified,
}

impl fmt::Display for AuthorityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorityStatus::Unverified => write!(f, "Unverified"),
            AuthorityStatus::Verified => write!(f, "Verified"),
        }
    }
}

impl AuthorityRecord {
    pub fn new(authority: Identity) -> Self {
        Self {
            authority,
            is_verified: false,
        }
    }

    pub fn status(&self) -> AuthorityStatus {
        if self.is_verified {
            AuthorityStatus::Verified
        } else {
            AuthorityStatus::Unverified
        }
    }
}

impl<L: Ledger> Registry<L> {
    /// Register `authority`, or return its existing record untouched.
    ///
    /// Only the authority itself may create its record, so `signer` must equal
    /// `authority` and must have signed the request.
    pub fn find_or_set_authority<S: SignerSet + ?Sized>(
        &mut self,
        auth: &S,
        authority: &Identity,
        signer: &Identity,
    ) -> Result<AuthorityRecord> {
        if signer != authority {
            tracing::warn!("Signer {} tried to register authority {}", signer, authority);
            return Err(RegistryError::Unauthorized(
                "authorities can only register themselves".to_string(),
            ));
        }
        require_signer(auth, signer)?;

        let address = self.derivator.authority(authority)?;
        let fresh = AuthorityRecord::new(*authority);

        match self.ledger.create(address, encode_record(&fresh)?) {
            Ok(()) => {
                tracing::info!("Registered authority {} at {}", authority, address);
                self.emit(RegistryEvent::AuthorityRegistered {
                    authority: *authority,
                });
                Ok(fresh)
            }
            Err(LedgerError::Occupied(_)) => {
                tracing::debug!("Authority {} already registered", authority);
                self.load(&address)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Set the verification flag of an existing authority. Admin only.
    pub fn update_authority<S: SignerSet + ?Sized>(
        &mut self,
        auth: &S,
        authority: &Identity,
        verified: bool,
        admin: &Identity,
    ) -> Result<AuthorityRecord> {
        if admin != &self.config.admin {
            tracing::warn!("Non-admin {} tried to update authority {}", admin, authority);
            return Err(RegistryError::Unauthorized(format!(
                "{admin} is not the registry admin"
            )));
        }
        require_signer(auth, admin)?;
        self.ensure_admin_matches_record()?;

        let address = self.derivator.authority(authority)?;
        let mut record: AuthorityRecord = self.load(&address)?;

        match (record.is_verified, verified) {
            (true, false) => Err(RegistryError::DemotionNotPermitted(*authority)),
            (current, requested) if current == requested => {
                tracing::debug!("Authority {} already {}", authority, record.status());
                Ok(record)
            }
            _ => {
                record.is_verified = verified;
                self.ledger.put(address, encode_record(&record)?)?;

                tracing::info!("Authority {} is now {}", authority, record.status());
                self.emit(RegistryEvent::AuthorityVerified {
                    authority: *authority,
                    is_verified: record.is_verified,
                });
                Ok(record)
            }
        }
    }

    /// Read the record for `authority`.
    pub fn fetch_authority(&self, authority: &Identity) -> Result<AuthorityRecord> {
        let address = self.derivator.authority(authority)?;
        self.load(&address)
    }
}
