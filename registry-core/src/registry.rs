//! The registry: ledger, configuration and the one-time initialization flag.
//!
//! Authority and schema operations are implemented in their own modules as
//! further `impl` blocks on [`Registry`].

use crate::address::AddressDerivator;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::ledger::{InMemoryLedger, Ledger, LedgerError};
use crate::serialization::{decode_record, encode_record, Record};
use crate::transaction::{Instruction, Outcome, SignerSet, Transaction};
use crate::types::{Address, Identity, SchemaUid};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Events kept before the oldest are dropped.
pub const MAX_BUFFERED_EVENTS: usize = 1024;

/// Process-wide state stored at the registry state address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    pub initialized: bool,
    /// Admin identity captured at initialization.
    pub admin: Identity,
}

impl Record for RegistryState {
    const TYPE_NAME: &'static str = "RegistryState";
}

/// Observable state changes, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    RegistryInitialized { admin: Identity },
    AuthorityRegistered { authority: Identity },
    AuthorityVerified { authority: Identity, is_verified: bool },
    SchemaRegistered { uid: SchemaUid, deployer: Identity, name: String },
}

/// Registry over a ledger.
///
/// Emitted events are buffered until [`Registry::take_events`]; hosts should
/// drain them after each transaction. Only the most recent
/// [`MAX_BUFFERED_EVENTS`] are kept.
pub struct Registry<L: Ledger = InMemoryLedger> {
    pub(crate) ledger: L,
    pub(crate) config: RegistryConfig,
    pub(crate) derivator: AddressDerivator,
    events: VecDeque<RegistryEvent>,
}

impl<L: Ledger> Registry<L> {
    pub fn new(ledger: L, config: RegistryConfig) -> Self {
        let derivator = AddressDerivator::new(config.program_id);
        Self {
            ledger,
            config,
            derivator,
            events: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Derivator clients use to compute the addresses this registry uses.
    pub fn derivator(&self) -> &AddressDerivator {
        &self.derivator
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn into_ledger(self) -> L {
        self.ledger
    }

    /// Mark the registry initialized. Succeeds exactly once.
    pub fn initialize(&mut self) -> Result<()> {
        let address = self.derivator.registry_state()?;
        let state = RegistryState {
            initialized: true,
            admin: self.config.admin,
        };

        match self.ledger.create(address, encode_record(&state)?) {
            Ok(()) => {
                tracing::info!("Registry initialized, admin {}", self.config.admin);
                self.emit(RegistryEvent::RegistryInitialized {
                    admin: self.config.admin,
                });
                Ok(())
            }
            Err(LedgerError::Occupied(_)) => Err(RegistryError::AlreadyInitialized),
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_initialized(&self) -> Result<bool> {
        let address = self.derivator.registry_state()?;
        match self.load::<RegistryState>(&address) {
            Ok(state) => Ok(state.initialized),
            Err(RegistryError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Admin recorded at initialization, if the registry is initialized.
    pub fn recorded_admin(&self) -> Result<Option<Identity>> {
        let address = self.derivator.registry_state()?;
        match self.load::<RegistryState>(&address) {
            Ok(state) => Ok(Some(state.admin)),
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The configured admin must match the one recorded at initialization.
    pub(crate) fn ensure_admin_matches_record(&self) -> Result<()> {
        match self.recorded_admin()? {
            Some(recorded) if recorded != self.config.admin => {
                tracing::warn!(
                    "Configured admin {} differs from recorded admin {}",
                    self.config.admin,
                    recorded
                );
                Err(RegistryError::Config(format!(
                    "configured admin {} does not match recorded admin {recorded}",
                    self.config.admin
                )))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized()? {
            Ok(())
        } else {
            Err(RegistryError::NotInitialized)
        }
    }

    /// Drain events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<RegistryEvent> {
        self.events.drain(..).collect()
    }

    /// Execute a signed transaction.
    pub fn process(&mut self, tx: &Transaction) -> Result<Outcome> {
        if &tx.program_id != self.derivator.program_id() {
            tracing::warn!("Transaction addressed to program {}", tx.program_id);
            return Err(RegistryError::Unauthorized(format!(
                "transaction is for program {}",
                tx.program_id
            )));
        }

        match &tx.instruction {
            Instruction::Initialize => {
                self.initialize()?;
                Ok(Outcome::Initialized)
            }
            Instruction::FindOrSetAuthority { authority, signer } => self
                .find_or_set_authority(tx, authority, signer)
                .map(Outcome::Authority),
            Instruction::UpdateAuthority {
                authority,
                verified,
                admin,
            } => self
                .update_authority(tx, authority, *verified, admin)
                .map(Outcome::Authority),
            Instruction::Register {
                deployer,
                payer,
                schema,
            } => self
                .register(tx, schema.clone(), deployer, payer)
                .map(Outcome::SchemaRegistered),
        }
    }

    pub(crate) fn load<T: Record>(&self, address: &Address) -> Result<T> {
        let bytes = self
            .ledger
            .get(address)
            .ok_or(RegistryError::NotFound(*address))?;
        Ok(decode_record(&bytes)?)
    }

    pub(crate) fn emit(&mut self, event: RegistryEvent) {
        tracing::debug!(?event, "registry event");
        if self.events.len() == MAX_BUFFERED_EVENTS {
            tracing::warn!("Event buffer full, dropping oldest event");
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Fail with `Unauthorized` unless `identity` signed the request.
pub(crate) fn require_signer<S: SignerSet + ?Sized>(auth: &S, identity: &Identity) -> Result<()> {
    if auth.verify_signer(identity) {
        Ok(())
    } else {
        tracing::warn!("Missing signature from {}", identity);
        Err(RegistryError::Unauthorized(format!(
            "{identity} did not sign the request"
        )))
    }
}
